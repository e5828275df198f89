use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use renderer::ShaderVariant;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StateError};
use crate::params::ParamValue;
use crate::presets::Preset;

/// Named snapshot of raw control values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub name: String,
    #[serde(with = "variant_name", default)]
    pub variant: ShaderVariant,
    pub values: BTreeMap<String, ParamValue>,
    pub created_at: DateTime<Utc>,
}

impl Skin {
    /// The skin's values as a preset, for layering onto a store.
    pub fn to_preset(&self) -> Preset {
        Preset::new(self.name.clone(), self.variant, self.values.clone())
    }
}

/// Current values in the same shape as an exported skin, minus the name.
#[derive(Debug, Serialize)]
struct StateExport<'a> {
    #[serde(with = "variant_name")]
    variant: ShaderVariant,
    values: &'a BTreeMap<String, ParamValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkinBook {
    skins: Vec<Skin>,
}

impl SkinBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `values` under `name`, or `Skin N` when no name is given.
    /// Saving over an existing name replaces it in place.
    pub fn save(
        &mut self,
        name: Option<&str>,
        variant: ShaderVariant,
        values: BTreeMap<String, ParamValue>,
        now: DateTime<Utc>,
    ) -> &Skin {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => self.next_default_name(),
        };
        let skin = Skin {
            name: name.clone(),
            variant,
            values,
            created_at: now,
        };
        let index = match self.skins.iter().position(|s| s.name == name) {
            Some(index) => {
                info!(skin = %name, "replacing skin");
                self.skins[index] = skin;
                index
            }
            None => {
                info!(skin = %name, "saving skin");
                self.skins.push(skin);
                self.skins.len() - 1
            }
        };
        &self.skins[index]
    }

    pub fn get(&self, name: &str) -> Option<&Skin> {
        self.skins.iter().find(|skin| skin.name == name)
    }

    pub fn delete(&mut self, name: &str) -> Result<Skin> {
        let index = self
            .skins
            .iter()
            .position(|skin| skin.name == name)
            .ok_or_else(|| StateError::UnknownSkin(name.to_string()))?;
        Ok(self.skins.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skin> {
        self.skins.iter()
    }

    /// Skin following `current` among those saved for `variant`, wrapping.
    pub fn next_after(&self, variant: ShaderVariant, current: Option<&str>) -> Option<&Skin> {
        let skins: Vec<&Skin> = self.skins.iter().filter(|s| s.variant == variant).collect();
        if skins.is_empty() {
            return None;
        }
        let next = current
            .and_then(|name| skins.iter().position(|s| s.name == name))
            .map_or(0, |index| (index + 1) % skins.len());
        Some(skins[next])
    }

    pub fn len(&self) -> usize {
        self.skins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skins.is_empty()
    }

    pub fn export_json(&self, name: &str) -> Result<String> {
        let skin = self
            .get(name)
            .ok_or_else(|| StateError::UnknownSkin(name.to_string()))?;
        Ok(serde_json::to_string_pretty(skin)?)
    }

    fn next_default_name(&self) -> String {
        let mut n = self.skins.len() + 1;
        loop {
            let candidate = format!("Skin {n}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Pretty JSON for the live values, for copying out of the preview.
pub fn export_current(
    variant: ShaderVariant,
    values: &BTreeMap<String, ParamValue>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&StateExport { variant, values })?)
}

pub(crate) mod variant_name {
    use renderer::ShaderVariant;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(variant: &ShaderVariant, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(variant.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ShaderVariant, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn values(hue: f32) -> BTreeMap<String, ParamValue> {
        BTreeMap::from([("emblemHue".to_string(), ParamValue::Scalar(hue))])
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn unnamed_skins_get_sequential_names() {
        let mut book = SkinBook::new();
        book.save(None, ShaderVariant::Lab, values(0.1), at(0));
        book.save(Some("  "), ShaderVariant::Lab, values(0.2), at(1));
        let names: Vec<_> = book.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Skin 1", "Skin 2"]);
    }

    #[test]
    fn default_name_skips_taken_names() {
        let mut book = SkinBook::new();
        book.save(Some("Skin 2"), ShaderVariant::Lab, values(0.1), at(0));
        let saved = book.save(None, ShaderVariant::Lab, values(0.2), at(1));
        assert_eq!(saved.name, "Skin 3");
    }

    #[test]
    fn saving_same_name_replaces() {
        let mut book = SkinBook::new();
        book.save(Some("dusk"), ShaderVariant::Lab, values(0.1), at(0));
        book.save(Some("dusk"), ShaderVariant::Lab, values(0.9), at(5));
        assert_eq!(book.len(), 1);
        let dusk = book.get("dusk").unwrap();
        assert_eq!(dusk.values["emblemHue"], ParamValue::Scalar(0.9));
        assert_eq!(dusk.created_at, at(5));
    }

    #[test]
    fn cycling_only_visits_matching_variant() {
        let mut book = SkinBook::new();
        book.save(Some("a"), ShaderVariant::Lab, values(0.1), at(0));
        book.save(Some("b"), ShaderVariant::Basic, values(0.2), at(1));
        book.save(Some("c"), ShaderVariant::Lab, values(0.3), at(2));
        let lab = ShaderVariant::Lab;
        assert_eq!(book.next_after(lab, None).unwrap().name, "a");
        assert_eq!(book.next_after(lab, Some("a")).unwrap().name, "c");
        assert_eq!(book.next_after(lab, Some("c")).unwrap().name, "a");
        assert_eq!(book.get("c").unwrap().to_preset().values, values(0.3));
    }

    #[test]
    fn delete_unknown_skin_errors() {
        let mut book = SkinBook::new();
        assert!(matches!(book.delete("nope"), Err(StateError::UnknownSkin(_))));
        book.save(Some("keep"), ShaderVariant::Basic, values(0.5), at(0));
        assert_eq!(book.delete("keep").unwrap().variant, ShaderVariant::Basic);
        assert!(book.is_empty());
    }

    #[test]
    fn export_json_carries_name_variant_and_values() {
        let mut book = SkinBook::new();
        book.save(Some("neon night"), ShaderVariant::Lab, values(0.8), at(0));
        let json: serde_json::Value =
            serde_json::from_str(&book.export_json("neon night").unwrap()).unwrap();
        assert_eq!(json["name"], "neon night");
        assert_eq!(json["variant"], "lab");
        assert!(json["values"]["emblemHue"].is_number());
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn export_current_omits_name() {
        let json: serde_json::Value =
            serde_json::from_str(&export_current(ShaderVariant::Basic, &values(0.3)).unwrap())
                .unwrap();
        assert_eq!(json["variant"], "basic");
        assert!(json.get("name").is_none());
    }
}
