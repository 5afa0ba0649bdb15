use anyhow::{anyhow, Context, Result};
use glam::Vec4;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::stage::MaterialParams;

/// Material definition as described by the authoring tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
    #[serde(default = "default_emissive")]
    pub emissive: Vec4,
    #[serde(default = "default_effect")]
    pub effect: Vec4,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            emissive: default_emissive(),
            effect: default_effect(),
        }
    }
}

impl MaterialDef {
    /// Parameter block consumed by the fragment stage.
    pub fn params(&self) -> MaterialParams {
        MaterialParams {
            emissive: self.emissive,
            effect: self.effect,
        }
    }
}

fn default_emissive() -> Vec4 {
    Vec4::ONE
}

fn default_effect() -> Vec4 {
    Vec4::new(0.5, 0.0, 0.0, 0.0)
}

/// Collection of named materials loaded from one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialLibrary {
    pub materials: Vec<MaterialDef>,
}

impl MaterialLibrary {
    /// Parses the material XML produced by the authoring tools.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid material XML")?;
        let mut materials: Vec<MaterialDef> = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("material")) {
            let mut def = MaterialDef::default();
            def.name = required_text(&node, "name")?;
            def.emissive = parse_vec4(optional_text(&node, "emissive"), def.emissive)
                .with_context(|| format!("invalid emissive color for {:?}", def.name))?;
            def.effect = parse_effect(optional_text(&node, "effect"), def.effect)
                .with_context(|| format!("invalid effect parameters for {:?}", def.name))?;
            if materials.iter().any(|existing| existing.name == def.name) {
                return Err(anyhow!("duplicate material name {:?}", def.name));
            }
            materials.push(def);
        }

        Ok(Self { materials })
    }

    pub fn get(&self, name: &str) -> Option<&MaterialDef> {
        self.materials.iter().find(|def| def.name == name)
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec4(value: Option<String>, default: Vec4) -> Result<Vec4> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = parse_floats(&value)?;
    if components.len() != 4 {
        return Err(anyhow!("expected 4 components, found {}", components.len()));
    }
    Ok(Vec4::from_slice(&components))
}

/// The effect vector accepts two to four components; missing trailing
/// components are zero.
fn parse_effect(value: Option<String>, default: Vec4) -> Result<Vec4> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = parse_floats(&value)?;
    if components.len() < 2 || components.len() > 4 {
        return Err(anyhow!(
            "expected 2 to 4 components, found {}",
            components.len()
        ));
    }
    let mut effect = [0.0; 4];
    effect[..components.len()].copy_from_slice(&components);
    Ok(Vec4::from_array(effect))
}

fn parse_floats(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse float {component:?}: {err}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    const SAMPLE: &str = r#"
    <materials>
        <material>
            <name>lamp</name>
            <emissive>1.0 0.6 0.25 1.0</emissive>
            <effect>0.5 0.0</effect>
        </material>
        <material>
            <name>beacon</name>
            <effect>0.25 1.5 0.1</effect>
        </material>
    </materials>
    "#;

    static LIBRARY: Lazy<MaterialLibrary> =
        Lazy::new(|| MaterialLibrary::from_xml(SAMPLE).expect("sample parses"));

    #[test]
    fn parses_materials_with_defaults() {
        assert_eq!(LIBRARY.materials.len(), 2);
        let lamp = LIBRARY.get("lamp").unwrap();
        assert_eq!(lamp.emissive, Vec4::new(1.0, 0.6, 0.25, 1.0));
        assert_eq!(lamp.effect, Vec4::new(0.5, 0.0, 0.0, 0.0));

        let beacon = LIBRARY.get("beacon").unwrap();
        assert_eq!(beacon.emissive, Vec4::ONE);
        assert_eq!(beacon.effect, Vec4::new(0.25, 1.5, 0.1, 0.0));
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<materials><material><effect>0.5 0</effect></material></materials>";
        assert!(MaterialLibrary::from_xml(bad).is_err());
    }

    #[test]
    fn duplicate_names_are_an_error() {
        let bad = r#"
        <materials>
            <material><name>lamp</name></material>
            <material><name>lamp</name></material>
        </materials>
        "#;
        let err = MaterialLibrary::from_xml(bad).unwrap_err();
        assert!(err.to_string().contains("duplicate material name"));
    }

    #[test]
    fn effect_rejects_a_single_component() {
        let bad = r#"
        <materials>
            <material><name>lamp</name><effect>0.5</effect></material>
        </materials>
        "#;
        assert!(MaterialLibrary::from_xml(bad).is_err());
    }

    #[test]
    fn params_mirror_the_definition() {
        let lamp = LIBRARY.get("lamp").unwrap();
        let params = lamp.params();
        assert_eq!(params.emissive, lamp.emissive);
        assert_eq!(params.effect, lamp.effect);
    }
}
