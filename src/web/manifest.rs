//! PWA manifest

use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl ManifestIcon {
    fn png(src: &str, size: u32, purpose: Option<&str>) -> Self {
        Self {
            src: src.to_string(),
            sizes: format!("{size}x{size}"),
            mime_type: "image/png".to_string(),
            purpose: purpose.map(str::to_string),
        }
    }
}

/// Web app manifest
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub icons: Vec<ManifestIcon>,
    pub theme_color: String,
    pub background_color: String,
    pub display: String,
    pub scope: String,
    pub start_url: String,
    pub orientation: String,
}

impl WebManifest {
    pub fn reppy() -> Self {
        Self {
            name: "Reppy - Workout and Diet Tracker".to_string(),
            short_name: "Reppy".to_string(),
            description: "Reppy is a smart tracking app that helps you reach your fitness & \
                health goals - track your workouts, whether you're into cardio or lifting, \
                and create reproducible recipes to conveniently log your meals."
                .to_string(),
            icons: vec![
                ManifestIcon::png("/assets/reppy-app-logo.png", 1154, Some("any maskable")),
                ManifestIcon::png("/assets/reppy-logo-192.png", 192, None),
                ManifestIcon::png("/assets/reppy-logo-180.png", 180, None),
            ],
            theme_color: "#ffffff".to_string(),
            background_color: "#ffffff".to_string(),
            display: "standalone".to_string(),
            scope: "/".to_string(),
            start_url: "/".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}
