//! JSON persistence for scene components.
//!
//! A save file is a single object `{"Size": n, "Components": [...]}` where each
//! component record is an object with exactly one key naming its kind:
//!
//! ```json
//! {"SpriteRenderer": {"Entity": 3, "AssetId": -1, "ZIndex": 0, "Color": [1, 1, 1, 1]}}
//! {"FontRenderer": {"Entity": 4, "AssetId": 0, "ZIndex": 2, "Color": [1, 1, 1, 1], "Text": "Score", "FontSize": 32}}
//! ```
//!
//! Reading is lenient: missing or malformed fields fall back to defaults.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec4};
use serde_json::{json, Map, Value};

use crate::asset::Assets;
use crate::error::SaveDataError;
use crate::scene::{FontRenderer, Sprite, SpriteRenderer, Transform};

pub const SPRITE_RENDERER: &str = "SpriteRenderer";
pub const FONT_RENDERER: &str = "FontRenderer";
pub const TRANSFORM: &str = "Transform";

/// Marks "no texture" and "no parent" in records.
pub const NONE_ID: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct SaveData {
    components: Vec<Value>,
}

impl SaveData {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn append(&mut self, record: Value) {
        self.components.push(record);
    }

    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Value] {
        &self.components
    }

    pub fn to_value(&self) -> Value {
        json!({
            "Size": self.components.len(),
            "Components": self.components,
        })
    }

    pub fn to_json_string(&self) -> Result<String, SaveDataError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// Parses a save file. `Components` must be an array; a disagreeing
    /// `Size` is reported and the array wins.
    pub fn from_json_str(text: &str) -> Result<Self, SaveDataError> {
        let root: Value = serde_json::from_str(text)?;
        let object = root
            .as_object()
            .ok_or_else(|| SaveDataError::Malformed("root is not an object".into()))?;
        let components = object
            .get("Components")
            .and_then(Value::as_array)
            .ok_or_else(|| SaveDataError::Malformed("missing Components array".into()))?
            .clone();

        match object.get("Size").and_then(Value::as_u64) {
            Some(size) if size as usize != components.len() => log::warn!(
                "Save data declares {} components but holds {}",
                size,
                components.len()
            ),
            None => log::debug!("Save data has no Size, using {}", components.len()),
            _ => {}
        }

        Ok(Self { components })
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SaveDataError> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?)?;
        log::info!("Saved {} components to {:?}", self.size(), path);
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SaveDataError> {
        let path = path.as_ref();
        let save = Self::from_json_str(&fs::read_to_string(path)?)?;
        log::info!("Loaded {} components from {:?}", save.size(), path);
        Ok(save)
    }
}

impl Default for SaveData {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind and body of a record, if it has the single-key shape.
pub fn record_kind(record: &Value) -> Option<(&str, &Map<String, Value>)> {
    let object = record.as_object()?;
    let (kind, body) = object.iter().next()?;
    if object.len() > 1 {
        log::warn!("Component record has {} keys, reading {}", object.len(), kind);
    }
    Some((kind.as_str(), body.as_object()?))
}

pub fn record_entity(body: &Map<String, Value>) -> Option<u32> {
    body.get("Entity")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
}

pub fn serialize_sprite_renderer(save: &mut SaveData, entity_id: u32, spr: &SpriteRenderer) {
    let asset_id = spr
        .texture()
        .map_or(NONE_ID, |handle| i64::from(handle.resource_id()));

    save.append(json!({
        SPRITE_RENDERER: {
            "Entity": entity_id,
            "AssetId": asset_id,
            "ZIndex": spr.z_index,
            "Color": spr.color.to_array(),
        }
    }));
}

/// Rebuilds a sprite renderer from either the whole record or its body.
///
/// Textured sprites take the texture's pixel size, untextured ones
/// [`Sprite::DEFAULT_SIZE`].
pub fn deserialize_sprite_renderer(record: &Value, assets: &Assets) -> SpriteRenderer {
    let body = record.get(SPRITE_RENDERER).unwrap_or(record);

    let texture = body
        .get("AssetId")
        .and_then(Value::as_i64)
        .filter(|&id| id != NONE_ID)
        .and_then(|id| assets.resolve(id));

    let z_index = read_z_index(body);
    let color = read_color(body);

    let sprite = match texture {
        Some(handle) => {
            let size = assets
                .textures
                .get(handle)
                .map_or(Sprite::DEFAULT_SIZE, |tex| tex.size());
            Sprite::textured(handle, size)
        }
        None => Sprite::default(),
    };

    SpriteRenderer {
        color,
        z_index,
        sprite,
    }
}

pub fn serialize_font_renderer(save: &mut SaveData, entity_id: u32, text: &FontRenderer) {
    let asset_id = text
        .font
        .map_or(NONE_ID, |handle| i64::from(handle.resource_id()));

    save.append(json!({
        FONT_RENDERER: {
            "Entity": entity_id,
            "AssetId": asset_id,
            "ZIndex": text.z_index,
            "Color": text.color.to_array(),
            "Text": text.text,
            "FontSize": text.font_size,
        }
    }));
}

/// Rebuilds a font renderer from either the whole record or its body.
pub fn deserialize_font_renderer(record: &Value, assets: &Assets) -> FontRenderer {
    let body = record.get(FONT_RENDERER).unwrap_or(record);

    let font = body
        .get("AssetId")
        .and_then(Value::as_i64)
        .filter(|&id| id != NONE_ID)
        .and_then(|id| assets.resolve_font(id));

    let font_size = body
        .get("FontSize")
        .and_then(Value::as_f64)
        .map(|size| size as f32)
        .filter(|size| *size > 0.0)
        .unwrap_or(FontRenderer::DEFAULT_FONT_SIZE);

    FontRenderer {
        font,
        text: body
            .get("Text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        color: read_color(body),
        z_index: read_z_index(body),
        font_size,
    }
}

/// Transform plus the naming and parenting that travel with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRecord {
    pub transform: Transform,
    pub name: Option<String>,
    pub parent: Option<u32>,
}

pub fn serialize_transform(
    save: &mut SaveData,
    entity_id: u32,
    transform: &Transform,
    name: Option<&str>,
    parent: Option<u32>,
) {
    save.append(json!({
        TRANSFORM: {
            "Entity": entity_id,
            "Name": name.unwrap_or_default(),
            "Position": transform.position.to_array(),
            "Scale": transform.scale.to_array(),
            "Rotation": transform.rotation,
            "Parent": parent.map_or(NONE_ID, i64::from),
        }
    }));
}

pub fn deserialize_transform(record: &Value) -> TransformRecord {
    let body = record.get(TRANSFORM).unwrap_or(record);

    let vec2 = |key: &str, default: Vec2| {
        body.get(key)
            .and_then(read_floats::<2>)
            .map_or(default, Vec2::from_array)
    };

    let transform = Transform {
        position: vec2("Position", Vec2::ZERO),
        scale: vec2("Scale", Vec2::ONE),
        rotation: body
            .get("Rotation")
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32,
    };

    let name = body
        .get("Name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    let parent = body
        .get("Parent")
        .and_then(Value::as_i64)
        .and_then(|id| u32::try_from(id).ok());

    TransformRecord {
        transform,
        name,
        parent,
    }
}

fn read_z_index(body: &Value) -> i32 {
    match body.get("ZIndex") {
        None => 0,
        Some(value) => value
            .as_i64()
            .and_then(|z| i32::try_from(z).ok())
            .unwrap_or_else(|| {
                log::warn!("Ignoring malformed ZIndex {}", value);
                0
            }),
    }
}

fn read_color(body: &Value) -> Vec4 {
    match body.get("Color") {
        None => Vec4::ONE,
        Some(value) => read_floats::<4>(value)
            .map(Vec4::from_array)
            .unwrap_or_else(|| {
                log::warn!("Ignoring malformed Color {}", value);
                Vec4::ONE
            }),
    }
}

fn read_floats<const N: usize>(value: &Value) -> Option<[f32; N]> {
    let array = value.as_array()?;
    if array.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(array) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{FontAsset, TextureAsset};

    fn assets_with_textures(count: usize) -> Assets {
        let mut assets = Assets::new();
        for i in 0..count {
            assets.add_texture(TextureAsset::solid(format!("tex{i}"), 8, 4, [255; 4]).unwrap());
        }
        assets
    }

    #[test]
    fn untextured_record_uses_sentinel_and_appends() {
        let mut save = SaveData::new();
        let spr = SpriteRenderer::new(Vec4::new(1.0, 0.5, 0.25, 1.0)).with_z_index(-2);
        serialize_sprite_renderer(&mut save, 7, &spr);

        assert_eq!(save.size(), 1);
        assert_eq!(
            save.components()[0],
            json!({"SpriteRenderer": {"Entity": 7, "AssetId": -1, "ZIndex": -2, "Color": [1.0, 0.5, 0.25, 1.0]}})
        );
        assert_eq!(save.to_value()["Size"], json!(1));
    }

    #[test]
    fn round_trip_keeps_texture_z_and_color() {
        let assets = assets_with_textures(3);
        let handle = assets.resolve(2).unwrap();
        let spr = SpriteRenderer::new(Vec4::new(0.1, 0.2, 0.3, 0.4))
            .with_z_index(5)
            .with_sprite(Sprite::textured(handle, Vec2::new(8.0, 4.0)));

        let mut save = SaveData::new();
        serialize_sprite_renderer(&mut save, 0, &spr);
        let restored = deserialize_sprite_renderer(&save.components()[0], &assets);

        assert_eq!(restored.texture(), Some(handle));
        assert_eq!(restored.z_index, 5);
        assert!(restored.color.abs_diff_eq(spr.color, 1e-6));
        assert_eq!(restored.sprite.size, Vec2::new(8.0, 4.0));
    }

    #[test]
    fn sentinel_asset_id_gives_untextured_white() {
        let assets = assets_with_textures(1);
        let record = json!({"AssetId": -1, "ZIndex": 3, "Color": [1, 1, 1, 1]});
        let spr = deserialize_sprite_renderer(&record, &assets);

        assert_eq!(spr.texture(), None);
        assert_eq!(spr.z_index, 3);
        assert_eq!(spr.color, Vec4::ONE);
    }

    #[test]
    fn missing_and_malformed_fields_fall_back_to_defaults() {
        let assets = assets_with_textures(1);

        let spr = deserialize_sprite_renderer(&json!({"SpriteRenderer": {}}), &assets);
        assert_eq!(spr, SpriteRenderer::default());

        let record = json!({"SpriteRenderer": {"AssetId": 99, "ZIndex": "high", "Color": [1, 0]}});
        let spr = deserialize_sprite_renderer(&record, &assets);
        assert_eq!(spr.texture(), None);
        assert_eq!(spr.z_index, 0);
        assert_eq!(spr.color, Vec4::ONE);
    }

    #[test]
    fn font_renderer_round_trip_and_lenient_read() {
        let mut assets = assets_with_textures(1);
        let texture = assets.resolve(0).unwrap();
        let font = assets.add_font(FontAsset::new("tiny", texture, Vec2::new(8.0, 4.0), Vec2::new(4.0, 4.0), '0', 2));
        let text = FontRenderer::new(font, "10\n01")
            .with_color(Vec4::new(1.0, 0.0, 0.0, 1.0))
            .with_z_index(6)
            .with_font_size(12.0);

        let mut save = SaveData::new();
        serialize_font_renderer(&mut save, 3, &text);
        assert_eq!(save.components()[0][FONT_RENDERER]["AssetId"], json!(0));
        assert_eq!(deserialize_font_renderer(&save.components()[0], &assets), text);

        let restored = deserialize_font_renderer(&json!({"FontRenderer": {"AssetId": 5, "FontSize": -1}}), &assets);
        assert_eq!(restored, FontRenderer::default());
    }

    #[test]
    fn transform_record_round_trip() {
        let transform = Transform::from_prs(Vec2::new(10.0, -4.0), 0.5, Vec2::new(2.0, 3.0));
        let mut save = SaveData::new();
        serialize_transform(&mut save, 4, &transform, Some("Gen Block"), Some(1));
        serialize_transform(&mut save, 1, &Transform::IDENTITY, None, None);

        let block = deserialize_transform(&save.components()[0]);
        assert_eq!(block.transform, transform);
        assert_eq!(block.name.as_deref(), Some("Gen Block"));
        assert_eq!(block.parent, Some(1));

        let root = deserialize_transform(&save.components()[1]);
        assert_eq!(root.name, None);
        assert_eq!(root.parent, None);
    }

    #[test]
    fn json_text_round_trip_and_shape_checks() {
        let mut save = SaveData::new();
        serialize_sprite_renderer(&mut save, 0, &SpriteRenderer::default());
        let text = save.to_json_string().unwrap();
        assert_eq!(SaveData::from_json_str(&text).unwrap(), save);

        assert!(matches!(
            SaveData::from_json_str("[1, 2]"),
            Err(SaveDataError::Malformed(_))
        ));
        assert!(matches!(
            SaveData::from_json_str(r#"{"Size": 0}"#),
            Err(SaveDataError::Malformed(_))
        ));
        assert!(matches!(
            SaveData::from_json_str("{"),
            Err(SaveDataError::Json(_))
        ));
    }

    #[test]
    fn record_kind_splits_single_key_records() {
        let record = json!({"Transform": {"Entity": 9}});
        let (kind, body) = record_kind(&record).unwrap();
        assert_eq!(kind, "Transform");
        assert_eq!(record_entity(body), Some(9));
        assert!(record_kind(&json!(3)).is_none());
    }
}
