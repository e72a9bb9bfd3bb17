use serde::{Deserialize, Serialize};

/// Cloud provider of the affected installation, in tag resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Kvm,
}

impl Provider {
    pub const PRIORITY: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Kvm];

    pub fn tag(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Kvm => "kvm",
        }
    }
}

/// Release pipeline the installation belongs to, in tag resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    Stable,
    Testing,
}

impl Pipeline {
    pub const PRIORITY: [Pipeline; 2] = [Pipeline::Stable, Pipeline::Testing];

    pub fn tag(&self) -> &'static str {
        match self {
            Pipeline::Stable => "stable",
            Pipeline::Testing => "testing",
        }
    }
}

/// What a single message told us about the incident.
///
/// The serialized form is the payload the alert automation consumes, so
/// optional fields are omitted rather than sent as empty strings. The two
/// classification flags never leave the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(skip)]
    pub is_alert: bool,
    #[serde(skip)]
    pub is_done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_pipeline: Option<Pipeline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub affects_management_cluster: bool,
    #[serde(default)]
    pub affects_workload_cluster: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_cluster_id: Option<String>,
}

impl AlertRecord {
    pub fn done() -> Self {
        Self {
            is_done: true,
            ..Default::default()
        }
    }
}
