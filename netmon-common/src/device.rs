//! Device catalog records and the snapshot embedded in topology nodes.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a device in the inventory.
pub type DeviceId = u64;

/// A device as returned by the device catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
}

impl DeviceRecord {
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case("online")
    }

    /// Case-insensitive match on name or IP address.
    ///
    /// An empty query matches every device.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.ip_address.to_lowercase().contains(&query)
    }

    /// Snapshot of the fields a placed node renders without a live lookup.
    pub fn display_data(&self) -> DisplayData {
        DisplayData {
            name: self.name.clone(),
            ip_address: self.ip_address.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
        }
    }
}

/// Denormalized device snapshot carried by every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
}

impl DisplayData {
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case("online")
    }

    /// Label shown under the node icon.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "Device"
        } else {
            &self.name
        }
    }
}

/// Device category, used to pick a node icon and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCategory {
    Switch,
    Server,
    Wifi,
    Cctv,
    Tas,
    Other,
}

impl DeviceCategory {
    pub fn from_label(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "switches" | "switch" => DeviceCategory::Switch,
            "servers" | "server" => DeviceCategory::Server,
            "wifi" => DeviceCategory::Wifi,
            "cctv" => DeviceCategory::Cctv,
            "tas" => DeviceCategory::Tas,
            _ => DeviceCategory::Other,
        }
    }

    /// Short glyph drawn inside the node.
    pub fn glyph(&self) -> &'static str {
        match self {
            DeviceCategory::Switch => "SW",
            DeviceCategory::Server => "SRV",
            DeviceCategory::Wifi => "AP",
            DeviceCategory::Cctv => "CAM",
            DeviceCategory::Tas => "TAS",
            DeviceCategory::Other => "NET",
        }
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
