use crate::fade::FadeStage;
use crate::render::{PageLayout, Region, RegionKind, RegionSpec};
use crate::session::SessionConfig;
use crate::util::{center_to_cols, fmt_hhmm, fmt_mmss};

// Glasses canvas.
pub const CANVAS_W: u16 = 576;
pub const CANVAS_H: u16 = 288;

// Right-anchored collapsed card, full height.
pub const COLLAPSED_W: u16 = 352;
pub const EXPANDED_W: u16 = CANVAS_W;
pub const CARD_Y: u16 = 0;
pub const CARD_H: u16 = CANVAS_H;

const HUD_MARGIN_X: u16 = 16;

const HEADER_W: u16 = 410;
const HEADER_X: u16 = (CANVAS_W - HEADER_W) / 2;
const HEADER_Y: u16 = 90;
const HEADER_H: u16 = 50;
const HEADER_PAD: u16 = 8;

const BREATH_X: u16 = HUD_MARGIN_X;
const BREATH_Y: u16 = 150;
const BREATH_W: u16 = CANVAS_W - HUD_MARGIN_X * 2;
const BREATH_H: u16 = 104;
const BREATH_PAD: u16 = 16;

const BADGE_W: u16 = COLLAPSED_W - 220;
const BADGE_H: u16 = 92;

// Monospace estimate for centering text into a pixel-sized region.
const CHAR_PX: u16 = 11;
pub const HEADER_COLS: usize = (HEADER_W / CHAR_PX) as usize;
pub const BREATH_COLS: usize = (BREATH_W / CHAR_PX) as usize;
pub const BADGE_COLS: usize = (BADGE_W / CHAR_PX) as usize;

/// Show the pattern hint in the header for this many cycles.
pub const HEADER_HINT_CYCLES: u64 = 2;

/// Invisible list-item character; list containers reject empty items.
const BLANK: &str = "\u{2800}";

pub fn center_to_header(text: &str) -> String {
    center_to_cols(text, HEADER_COLS)
}

pub fn center_to_breath(text: &str) -> String {
    center_to_cols(text, BREATH_COLS)
}

pub fn center_to_badge(text: &str) -> String {
    center_to_cols(text, BADGE_COLS)
}

/// Collapsed badge: name, today's total, and the tap affordance.
pub fn collapsed_badge_text(accum_secs_today: u64) -> String {
    [
        center_to_badge("STILLNESS"),
        center_to_badge(&format!("·{}·", fmt_mmss(accum_secs_today))),
        center_to_badge("Tap to begin"),
    ]
    .join("\n")
}

/// Expanded header line: app name, pattern name, an early-cycles pattern
/// hint, and the running clock (mm:ss until an hour, then hh:mm).
pub fn header_text(config: &SessionConfig, live_secs: u64, cycle_index: u64) -> String {
    let clockish = if live_secs < 3600 {
        fmt_mmss(live_secs)
    } else {
        fmt_hhmm(live_secs)
    };
    let hint = if cycle_index < HEADER_HINT_CYCLES {
        format!(" · {}", config.pattern_hint())
    } else {
        String::new()
    };
    center_to_header(&format!("STILLNESS · {}{} · {}", config.name, hint, clockish))
}

/// Breath region body: glyph row plus whisper line (blank when no whisper).
pub fn breath_body(row: &str, whisper: Option<&str>) -> String {
    let line1 = center_to_breath(row);
    let line2 = match whisper {
        Some(word) => center_to_breath(word),
        None => " ".repeat(BREATH_COLS),
    };
    format!("{}\n{}", line1, line2)
}

fn frame_spec(x: u16, width: u16, stage: FadeStage) -> RegionSpec {
    let (bw, bc, br) = match stage {
        FadeStage::Normal => (1, 2, 6),
        FadeStage::Dim => (1, 1, 6),
        FadeStage::Off => (0, 0, 0),
    };
    RegionSpec {
        region: Region::Frame,
        kind: RegionKind::Text,
        x,
        y: CARD_Y,
        w: width,
        h: CARD_H,
        border_width: bw,
        border_color: bc,
        border_radius: br,
        padding: 0,
        content: String::new(),
        captures_events: false,
    }
}

fn debug_spec(x: u16) -> RegionSpec {
    RegionSpec {
        region: Region::Debug,
        kind: RegionKind::Text,
        x,
        y: CANVAS_H - 60,
        w: 220,
        h: 50,
        border_width: 0,
        border_color: 0,
        border_radius: 0,
        padding: 0,
        content: String::new(),
        captures_events: false,
    }
}

/// Collapsed mode: frame, badge, and the full-card list gesture catcher.
pub fn collapsed_page(accum_secs_today: u64, debug: bool) -> PageLayout {
    let x = CANVAS_W - COLLAPSED_W;
    let bx = x + (COLLAPSED_W - BADGE_W) / 2;
    let by = (CANVAS_H - BADGE_H) / 2;

    let mut regions = vec![
        frame_spec(x, COLLAPSED_W, FadeStage::Normal),
        RegionSpec {
            region: Region::Badge,
            kind: RegionKind::Text,
            x: bx,
            y: by,
            w: BADGE_W,
            h: BADGE_H,
            border_width: 0,
            border_color: 0,
            border_radius: 0,
            padding: 0,
            content: collapsed_badge_text(accum_secs_today),
            captures_events: false,
        },
        RegionSpec {
            region: Region::Input,
            kind: RegionKind::List,
            x,
            y: CARD_Y,
            w: COLLAPSED_W,
            h: CARD_H,
            border_width: 0,
            border_color: 0,
            border_radius: 0,
            padding: 0,
            content: BLANK.to_string(),
            captures_events: true,
        },
    ];
    if debug {
        regions.push(debug_spec(x + 8));
    }
    PageLayout { regions }
}

/// Expanded mode: frame and header at their current fade stages, plus the
/// borderless breath region (which captures gestures while expanded).
pub fn expanded_page(
    header_stage: FadeStage,
    frame_stage: FadeStage,
    header_content: String,
    breath_content: String,
    debug: bool,
) -> PageLayout {
    let header_off = header_stage == FadeStage::Off;

    let mut regions = vec![
        frame_spec(0, EXPANDED_W, frame_stage),
        RegionSpec {
            region: Region::Header,
            kind: RegionKind::Text,
            x: HEADER_X,
            y: HEADER_Y,
            w: HEADER_W,
            h: if header_off { 1 } else { HEADER_H },
            border_width: if header_off { 0 } else { 1 },
            border_color: match header_stage {
                FadeStage::Normal => 2,
                FadeStage::Dim => 1,
                FadeStage::Off => 0,
            },
            border_radius: if header_off { 0 } else { 6 },
            padding: if header_off { 0 } else { HEADER_PAD },
            content: if header_off { String::new() } else { header_content },
            captures_events: false,
        },
        RegionSpec {
            region: Region::Breath,
            kind: RegionKind::Text,
            x: BREATH_X,
            y: BREATH_Y,
            w: BREATH_W,
            h: BREATH_H,
            border_width: 0,
            border_color: 0,
            border_radius: 0,
            padding: BREATH_PAD,
            content: breath_content,
            captures_events: true,
        },
    ];
    if debug {
        regions.push(debug_spec(8));
    }
    PageLayout { regions }
}
