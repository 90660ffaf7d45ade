use glam::{Vec2, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use wgpu_sprites::app::App;
use wgpu_sprites::asset::{Assets, FontAsset, Handle, TextureAsset};
use wgpu_sprites::scene::{
    FontRenderer, RotateAnimation, SaveData, Scene, Sprite, SpriteRenderer, Spritesheet,
    Transform,
};
use wgpu_sprites::settings::RenderSettings;
use wgpu_sprites::TextureError;

const BLOCKS_TEXTURE: &str = "assets/images/decorationsAndBlocks.png";
const CONFETTI_TEXTURES: usize = 20;
const CONFETTI_COUNT: usize = 2500;
const DEFAULT_SAVE_PATH: &str = "scene.json";

// 3x5 glyphs, one row per byte with the leftmost pixel in bit 2.
const FONT_GLYPHS: [(char, [u8; 5]); 36] = [
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b001, 0b001, 0b001]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
];
const FONT_FIRST: char = ' ';
const FONT_LAST: char = 'Z';
// Each 3x5 glyph sits in a 4x6 cell so neighbours never touch.
const FONT_CELL: (u32, u32) = (4, 6);

/// White-on-transparent atlas covering `FONT_FIRST..=FONT_LAST` in one row.
fn demo_font(assets: &mut Assets) -> Result<Handle<FontAsset>, TextureError> {
    let count = (FONT_LAST as u32 - FONT_FIRST as u32 + 1) as usize;
    let (cell_w, cell_h) = FONT_CELL;
    let width = cell_w * count as u32;

    let mut pixels = vec![0u8; (width * cell_h * 4) as usize];
    for (c, rows) in FONT_GLYPHS {
        let x0 = (c as u32 - FONT_FIRST as u32) * cell_w;
        for (y, bits) in rows.iter().enumerate() {
            for x in 0..3 {
                if bits & (0b100 >> x) != 0 {
                    let at = ((y as u32 * width + x0 + x) * 4) as usize;
                    pixels[at..at + 4].copy_from_slice(&[255; 4]);
                }
            }
        }
    }

    let atlas = TextureAsset::from_rgba8("demo font", width, cell_h, pixels)?;
    let size = atlas.size();
    let texture = assets.add_texture(atlas);
    let cell = Vec2::new(cell_w as f32, cell_h as f32);
    Ok(assets.add_font(FontAsset::new("demo font", texture, size, cell, FONT_FIRST, count)))
}

fn load_blocks_texture(assets: &mut Assets) -> Result<Handle<TextureAsset>, TextureError> {
    let texture = match TextureAsset::from_path(BLOCKS_TEXTURE) {
        Ok(texture) => texture,
        Err(err) => {
            log::warn!("{}; using a generated sheet instead", err);
            TextureAsset::checkerboard("blocks", 144, 16, [220, 180, 90, 255], [90, 60, 40, 255])?
        }
    };
    Ok(assets.add_texture(texture))
}

struct DemoAssets {
    assets: Assets,
    blocks: Handle<TextureAsset>,
    confetti: Vec<Handle<TextureAsset>>,
    font: Handle<FontAsset>,
}

/// Textures shared by the demo and by scenes saved from it. The confetti
/// colours come from a fixed seed so asset ids resolve the same way on load.
fn demo_assets() -> Result<DemoAssets, TextureError> {
    let mut assets = Assets::new();
    let blocks = load_blocks_texture(&mut assets)?;

    let mut rng = SmallRng::seed_from_u64(0xc0105);
    let confetti: Vec<Handle<TextureAsset>> = (0..CONFETTI_TEXTURES)
        .map(|i| -> Result<Handle<TextureAsset>, TextureError> {
            let a = [rng.gen(), rng.gen(), rng.gen(), 255];
            let b = [rng.gen(), rng.gen(), rng.gen(), 255];
            let texture = TextureAsset::checkerboard(format!("confetti {i}"), 8, 2, a, b)?;
            Ok(assets.add_texture(texture))
        })
        .collect::<Result<_, _>>()?;

    let font = demo_font(&mut assets)?;

    Ok(DemoAssets {
        assets,
        blocks,
        confetti,
        font,
    })
}

/// A 10x10 grid of tinted blocks under one container, a row of spritesheet
/// blocks on top of it and a field of confetti behind it.
fn demo_scene() -> Result<Scene, TextureError> {
    let DemoAssets {
        assets,
        blocks,
        confetti,
        font,
    } = demo_assets()?;
    let sheet_size = assets
        .textures
        .get(blocks)
        .map_or(Vec2::splat(144.0), TextureAsset::size);
    let sheet = Spritesheet::new(blocks, sheet_size, 16.0, 16.0, 81, 0.0);
    let mut rng = SmallRng::seed_from_u64(0x5eed);

    let mut scene = Scene::with_assets(assets);

    scene.spawn_text(
        "Title",
        Transform::from_position(Vec2::new(100.0, 1000.0)),
        FontRenderer::new(font, "WGPU SPRITES\nPRESS S TO SAVE")
            .with_font_size(36.0)
            .with_z_index(2),
    );

    let container = scene.spawn_group("Container", Transform::IDENTITY);
    let (start, size, padding) = (Vec2::new(100.0, 80.0), 20.0, 3.0);
    for i in 0..10 {
        for j in 0..10 {
            let position = start + Vec2::new(i as f32, j as f32) * (size + padding);
            let color = Vec4::new(position.x / (100.0 * size), position.y / (80.0 * size), 1.0, 1.0);
            let result = scene.spawn_child(
                container,
                "Gen Block",
                Transform::from_position(position).with_scale(Vec2::splat(0.6)),
                SpriteRenderer::new(color),
            );
            if let Err(err) = result {
                log::error!("Failed to add block: {}", err);
            }
        }
    }

    for i in 0..sheet.len().min(24) {
        let Some(sprite) = sheet.sprite(i) else {
            continue;
        };
        let position = Vec2::new(400.0 + i as f32 * 48.0, 600.0);
        let entity = scene.spawn_sprite(
            "Textured Block",
            Transform::from_position(position).with_scale(Vec2::splat(2.0)),
            SpriteRenderer::default().with_sprite(sprite).with_z_index(1),
        );
        if i % 4 == 0 {
            let _ = scene.world.insert_one(entity, RotateAnimation { speed: 1.5 });
        }
    }

    for _ in 0..CONFETTI_COUNT {
        let texture = confetti[rng.gen_range(0..confetti.len())];
        let position = Vec2::new(rng.gen_range(0.0..1920.0), rng.gen_range(0.0..1080.0));
        let rotation = rng.gen_range(0.0..std::f32::consts::TAU);
        let tint = Vec4::new(1.0, 1.0, 1.0, rng.gen_range(0.4..1.0));
        scene.spawn_sprite(
            "Confetti",
            Transform::from_position(position).with_rotation(rotation),
            SpriteRenderer::new(tint)
                .with_sprite(Sprite::textured(texture, Vec2::splat(12.0)))
                .with_z_index(-1),
        );
    }

    Ok(scene)
}

/// `wgpu-sprites [scene.json]`: shows the saved scene if one is given.
/// Pressing S writes the current scene back to that path.
fn build_scene() -> Result<Scene, TextureError> {
    let Some(path) = std::env::args().nth(1) else {
        return demo_scene();
    };

    match SaveData::read_from(&path) {
        Ok(save) => Ok(Scene::load(&save, demo_assets()?.assets)),
        Err(err) => {
            log::error!("Failed to load {}: {}; showing the demo", path, err);
            demo_scene()
        }
    }
}

fn main() {
    wgpu_sprites::init_logging();

    let scene = match build_scene() {
        Ok(scene) => scene,
        Err(err) => {
            log::error!("Failed to build the scene: {}", err);
            return;
        }
    };
    let settings = RenderSettings::load();
    let save_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SAVE_PATH.to_string());
    let app = App::new(scene, settings)
        .with_title("wgpu sprites")
        .with_save_path(save_path);

    if let Err(err) = wgpu_sprites::run(app) {
        eprintln!("Application error: {err}");
    }
}
