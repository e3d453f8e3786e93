//! Drawing of the fight.
//!
//! The arena is drawn in its own logical coordinates through a `Camera2D`
//! that letterboxes it into the window. Fighters are drawn from their sprite
//! sheet; a fighter without a texture, or showing a placeholder frame, is
//! drawn as a plain box so a broken asset never hides it.
use bevy_ecs::prelude::*;
use log::{info, warn};
use raylib::prelude::*;

use crate::components::fighter::{Fighter, PlayerSlot};
use crate::resources::animationstore::AnimationStore;
use crate::resources::gamestate::{GameState, GameStates};
use crate::resources::matchstate::{ArenaSize, MatchState, RoundOption, RoundPhase, SessionSummary};
use crate::resources::storage::Storage;
use crate::resources::texturestore::TextureStore;
use crate::resources::worldtime::WorldTime;

const HEALTH_BAR_WIDTH: f32 = 400.0;
const HEALTH_BAR_HEIGHT: f32 = 30.0;
const HUD_MARGIN: f32 = 20.0;

/// Load every character's sprite sheet and record its size so animation
/// clips are cut to the real sheet.
pub fn load_character_sheets(world: &mut World, rl: &mut RaylibHandle, th: &RaylibThread) {
    let Some(storage) = world.get_resource::<Storage>().cloned() else {
        return;
    };
    let names = match storage.characters.list() {
        Ok(names) => names,
        Err(e) => {
            warn!("Could not list characters: {}", e);
            return;
        }
    };

    let mut textures = TextureStore::new();
    {
        let mut animations = world.resource_mut::<AnimationStore>();
        for name in names {
            let def = match storage.characters.get(&name) {
                Ok(def) => def,
                Err(e) => {
                    warn!("Skipping sprite sheet of '{}': {}", name, e);
                    continue;
                }
            };
            match rl.load_texture(th, &def.sprite_sheet_path) {
                Ok(texture) => {
                    info!(
                        "Loaded sprite sheet of '{}' ({}x{})",
                        name, texture.width, texture.height
                    );
                    animations.set_sheet_size(&name, texture.width as f32, texture.height as f32);
                    textures.insert(name, texture);
                }
                Err(e) => warn!(
                    "Sprite sheet '{}' of '{}' could not be loaded: {}",
                    def.sprite_sheet_path, name, e
                ),
            }
        }
    }
    world.insert_resource(textures);
}

fn slot_color(slot: PlayerSlot) -> Color {
    match slot {
        PlayerSlot::One => Color::SKYBLUE,
        PlayerSlot::Two => Color::ORANGE,
    }
}

fn draw_fighter<D: RaylibDraw>(d: &mut D, fighter: &Fighter, textures: &TextureStore) {
    let frame = fighter.current_frame();
    let rect = fighter.rect();
    match textures.get(&fighter.character) {
        Some(texture) if !frame.placeholder => {
            let scale = fighter.layout.scale;
            let mut src = Rectangle::new(frame.src.x, frame.src.y, frame.src.w, frame.src.h);
            if fighter.flip() {
                src.width = -src.width;
            }
            let dest = Rectangle::new(
                rect.x - fighter.layout.offset[0] * scale,
                rect.y - fighter.layout.offset[1] * scale,
                frame.src.w * scale,
                frame.src.h * scale,
            );
            d.draw_texture_pro(texture, src, dest, Vector2::zero(), 0.0, Color::WHITE);
        }
        _ => d.draw_rectangle(
            rect.x as i32,
            rect.y as i32,
            rect.w as i32,
            rect.h as i32,
            slot_color(fighter.slot),
        ),
    }
}

fn draw_health_bar<D: RaylibDraw>(d: &mut D, fighter: &Fighter, x: f32) {
    let ratio = if fighter.base_health() == 0 {
        0.0
    } else {
        fighter.health() as f32 / fighter.base_health() as f32
    };
    d.draw_rectangle(
        (x - 2.0) as i32,
        (HUD_MARGIN - 2.0) as i32,
        (HEALTH_BAR_WIDTH + 4.0) as i32,
        (HEALTH_BAR_HEIGHT + 4.0) as i32,
        Color::WHITE,
    );
    d.draw_rectangle(
        x as i32,
        HUD_MARGIN as i32,
        HEALTH_BAR_WIDTH as i32,
        HEALTH_BAR_HEIGHT as i32,
        Color::RED,
    );
    d.draw_rectangle(
        x as i32,
        HUD_MARGIN as i32,
        (HEALTH_BAR_WIDTH * ratio) as i32,
        HEALTH_BAR_HEIGHT as i32,
        Color::YELLOW,
    );
    d.draw_text(
        fighter.display_name(),
        x as i32,
        (HUD_MARGIN + HEALTH_BAR_HEIGHT + 6.0) as i32,
        20,
        Color::WHITE,
    );
}

fn draw_centered<D: RaylibDraw>(d: &mut D, text: &str, width: f32, y: f32, size: i32, color: Color) {
    let x = (width - measure_text(text, size) as f32) / 2.0;
    d.draw_text(text, x as i32, y as i32, size, color);
}

fn draw_round_over<D: RaylibDraw>(d: &mut D, state: &MatchState, arena: ArenaSize, now: f32) {
    let banner = match state.last_result.as_ref().and_then(|r| r.winner_name()) {
        Some(name) => format!("{} wins!", name),
        None => "Draw".to_string(),
    };
    draw_centered(d, &banner, arena.width, arena.height / 3.0, 48, Color::GOLD);
    if !state.menu_ready(now) {
        return;
    }
    for (i, option) in [RoundOption::Retry, RoundOption::Exit].into_iter().enumerate() {
        let color = if option == state.selected {
            Color::YELLOW
        } else {
            Color::LIGHTGRAY
        };
        let y = arena.height / 2.0 + i as f32 * 40.0;
        draw_centered(d, option.label(), arena.width, y, 32, color);
    }
}

fn draw_menu<D: RaylibDraw>(d: &mut D, summary: Option<&SessionSummary>, arena: ArenaSize) {
    if let Some(summary) = summary {
        let text = format!(
            "{} round(s)  {} - {}",
            summary.rounds, summary.score[0], summary.score[1]
        );
        draw_centered(d, &text, arena.width, arena.height / 3.0, 40, Color::GOLD);
    }
    draw_centered(
        d,
        "Enter: fight again    Esc: quit",
        arena.width,
        arena.height / 2.0,
        24,
        Color::LIGHTGRAY,
    );
}

/// Draw one frame: arena, fighters, HUD and whatever overlay the round
/// phase needs.
#[allow(clippy::too_many_arguments)]
pub fn render_system(
    mut rl: NonSendMut<RaylibHandle>,
    th: NonSend<RaylibThread>,
    fighters: Query<&Fighter>,
    textures: Option<Res<TextureStore>>,
    state: Res<MatchState>,
    game_state: Res<GameState>,
    summary: Option<Res<SessionSummary>>,
    arena: Res<ArenaSize>,
    time: Res<WorldTime>,
) {
    let empty = TextureStore::new();
    let textures = textures.as_deref().unwrap_or(&empty);
    let arena = *arena;

    let mut d = rl.begin_drawing(&th);
    d.clear_background(Color::BLACK);

    let (sw, sh) = (d.get_screen_width() as f32, d.get_screen_height() as f32);
    let zoom = (sw / arena.width).min(sh / arena.height);
    let camera = Camera2D {
        offset: Vector2 {
            x: (sw - arena.width * zoom) * 0.5,
            y: (sh - arena.height * zoom) * 0.5,
        },
        target: Vector2::zero(),
        rotation: 0.0,
        zoom,
    };

    let mut d2 = d.begin_mode2D(camera);
    d2.draw_rectangle(
        0,
        0,
        arena.width as i32,
        arena.height as i32,
        Color::DARKGRAY,
    );

    if game_state.is(GameStates::Menu) {
        draw_menu(&mut d2, summary.as_deref(), arena);
        return;
    }

    let mut ordered: Vec<&Fighter> = fighters.iter().collect();
    ordered.sort_by_key(|f| f.slot);
    for fighter in &ordered {
        draw_fighter(&mut d2, fighter, textures);
    }
    for fighter in &ordered {
        let x = match fighter.slot {
            PlayerSlot::One => HUD_MARGIN,
            PlayerSlot::Two => arena.width - HUD_MARGIN - HEALTH_BAR_WIDTH,
        };
        draw_health_bar(&mut d2, fighter, x);
    }

    let score = format!("{} - {}", state.score[0], state.score[1]);
    draw_centered(&mut d2, &score, arena.width, HUD_MARGIN, 30, Color::WHITE);

    match state.phase {
        RoundPhase::Intro { remaining } => draw_centered(
            &mut d2,
            &remaining.to_string(),
            arena.width,
            arena.height / 3.0,
            80,
            Color::RED,
        ),
        RoundPhase::Live => {}
        RoundPhase::RoundOver { .. } => draw_round_over(&mut d2, &state, arena, time.elapsed),
    }
}
