use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The display rejected a page build with a non-zero status.
    #[error("display rejected page build (status {0})")]
    Rejected(i32),
    #[error("display bridge unavailable")]
    Unavailable,
}

/// Display regions. IDs are stable across rebuilds; the display addresses
/// containers by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Full-card gesture catcher, present in collapsed mode only.
    Input,
    /// Outer border frame.
    Frame,
    Header,
    Breath,
    /// Collapsed badge.
    Badge,
    /// Optional debug overlay.
    Debug,
}

impl Region {
    pub fn id(self) -> u8 {
        match self {
            Region::Input => 1,
            Region::Frame => 2,
            Region::Header => 3,
            Region::Breath => 4,
            Region::Badge => 5,
            Region::Debug => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Input => "input",
            Region::Frame => "frame",
            Region::Header => "header",
            Region::Breath => "breath",
            Region::Badge => "badge",
            Region::Debug => "debug",
        }
    }
}

/// Plain text container vs. list container (list containers are the only
/// ones that reliably capture taps in collapsed mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Text,
    List,
}

/// One visible region: position, size, border emphasis, content.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub region: Region,
    pub kind: RegionKind,
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
    pub border_width: u8,
    pub border_color: u8,
    pub border_radius: u8,
    pub padding: u16,
    pub content: String,
    pub captures_events: bool,
}

/// Structured description of everything visible in one UI mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub regions: Vec<RegionSpec>,
}

impl PageLayout {
    pub fn region(&self, region: Region) -> Option<&RegionSpec> {
        self.regions.iter().find(|r| r.region == region)
    }
}

/// Outbound rendering boundary.
///
/// `create_page` is the one fatal call: a failure there is an unrecoverable
/// startup error. Everything after that is retried implicitly by the next
/// tick's push, so callers swallow the errors.
pub trait DisplayBridge {
    fn create_page(&mut self, layout: &PageLayout) -> Result<(), RenderError>;
    fn rebuild_page(&mut self, layout: &PageLayout) -> Result<(), RenderError>;
    fn update_text(&mut self, region: Region, content: &str) -> Result<(), RenderError>;
}

/// Content-equality cache in front of `update_text`: a push whose content
/// matches the last successfully pushed content for that region is skipped.
/// Reset on every page rebuild, since a rebuild repaints everything.
#[derive(Debug, Default)]
pub struct RenderCache {
    last: HashMap<Region, String>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last.clear();
    }

    /// Push `content` to `region` unless it is unchanged. Returns whether a
    /// push actually went out. The cache records content only after a
    /// successful push, so a failed push is retried next time.
    pub fn push(
        &mut self,
        bridge: &mut dyn DisplayBridge,
        region: Region,
        content: &str,
    ) -> Result<bool, RenderError> {
        if self.last.get(&region).map(String::as_str) == Some(content) {
            return Ok(false);
        }
        bridge.update_text(region, content)?;
        self.last.insert(region, content.to_string());
        Ok(true)
    }
}

/// Bridge that records every call; drives the headless tests.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    pub pages: Vec<PageLayout>,
    pub pushes: Vec<(Region, String)>,
    pub fail_create: bool,
    pub fail_updates: bool,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents pushed to one region, in order.
    pub fn pushed_to(&self, region: Region) -> Vec<&str> {
        self.pushes
            .iter()
            .filter(|(r, _)| *r == region)
            .map(|(_, c)| c.as_str())
            .collect()
    }

    pub fn last_page(&self) -> Option<&PageLayout> {
        self.pages.last()
    }
}

impl DisplayBridge for RecordingBridge {
    fn create_page(&mut self, layout: &PageLayout) -> Result<(), RenderError> {
        if self.fail_create {
            return Err(RenderError::Rejected(-1));
        }
        self.pages.push(layout.clone());
        Ok(())
    }

    fn rebuild_page(&mut self, layout: &PageLayout) -> Result<(), RenderError> {
        if self.fail_create {
            return Err(RenderError::Rejected(-1));
        }
        self.pages.push(layout.clone());
        Ok(())
    }

    fn update_text(&mut self, region: Region, content: &str) -> Result<(), RenderError> {
        if self.fail_updates {
            return Err(RenderError::Unavailable);
        }
        self.pushes.push((region, content.to_string()));
        Ok(())
    }
}
