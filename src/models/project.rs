//! Project catalog records and the index records built from them.

use serde::{Deserialize, Deserializer, Serialize};

/// Value of `isJointOrURECA` for projects that are neither joint nor URECA.
pub const NOT_JOINT: &str = "No";

fn default_joint_flag() -> String {
    NOT_JOINT.to_string()
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn joint_flag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_joint_flag))
}

/// Accepts `"SCSE0001"`, `1234` or `null` for the project number.
fn project_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

/// A project as it appears in the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Stable identifier; empty when the source record had none.
    #[serde(default, deserialize_with = "project_number")]
    pub project_no: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub supervisor: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub project_type: String,

    #[serde(
        rename = "isJointOrURECA",
        default = "default_joint_flag",
        deserialize_with = "joint_flag"
    )]
    pub is_joint_or_ureca: String,
}

impl Default for ProjectRecord {
    fn default() -> Self {
        Self {
            project_no: String::new(),
            title: String::new(),
            summary: String::new(),
            keywords: Vec::new(),
            supervisor: String::new(),
            category: String::new(),
            project_type: String::new(),
            is_joint_or_ureca: default_joint_flag(),
        }
    }
}

impl ProjectRecord {
    /// The record's identifier, if it has a usable one. Kept exactly as read;
    /// whitespace only decides whether the number is blank.
    pub fn id(&self) -> Option<&str> {
        (!self.project_no.trim().is_empty()).then_some(self.project_no.as_str())
    }

    /// Metadata retained in the index for filtering and display.
    pub fn metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            title: self.title.clone(),
            supervisor: self.supervisor.clone(),
            category: self.category.clone(),
            project_type: self.project_type.clone(),
            keywords: self.keywords.clone(),
            is_joint_or_ureca: self.is_joint_or_ureca.clone(),
        }
    }
}

/// Metadata stored next to each vector.
///
/// Field names on the wire match the catalog file so the index stays
/// filterable by the same names (`category`, `type`, `isJointOrURECA`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub supervisor: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub project_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(
        rename = "isJointOrURECA",
        default = "default_joint_flag",
        deserialize_with = "joint_flag"
    )]
    pub is_joint_or_ureca: String,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            supervisor: String::new(),
            category: String::new(),
            project_type: String::new(),
            keywords: Vec::new(),
            is_joint_or_ureca: default_joint_flag(),
        }
    }
}

impl ProjectMetadata {
    /// Look up a filterable string field by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "supervisor" => Some(&self.supervisor),
            "category" => Some(&self.category),
            "type" => Some(&self.project_type),
            "isJointOrURECA" => Some(&self.is_joint_or_ureca),
            _ => None,
        }
    }
}

/// A vector ready to be written to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Always the source record's `projectNo`.
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ProjectMetadata,
}
