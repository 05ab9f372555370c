//! Layout configuration parsed from a short textual test code.
//!
//! A configuration code is a string of dot-separated tokens, e.g.
//! `"bsa.de.mg."`. Each recognized token selects one value on one
//! configuration axis; later tokens overwrite earlier ones on the same
//! axis. Unrecognized tokens are ignored so that codes written for other
//! harness variants keep working.

use log::warn;

/// Default number of object instances when none (or an unparseable count)
/// is given on the command line.
pub const DEFAULT_INSTANCE_COUNT: usize = 5_000;

/// Default configuration code: per-instance separate buffers, non-indexed
/// draws, host-side matrix composition.
pub const DEFAULT_CONFIG_CODE: &str = "bua.da.mc.";

/// How vertex buffers are shared between instances of an object class and
/// whether position and normal data share one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingMode {
    /// `bua` — every instance owns one buffer per attribute.
    #[default]
    UnsharedSeparate,
    /// `bsa` — one buffer per attribute, shared by all instances.
    SharedSeparate,
    /// `buj` — every instance owns a combined position+normal buffer.
    UnsharedJoint,
    /// `bsj` — one combined position+normal buffer, shared by all instances.
    SharedJoint,
}

impl SharingMode {
    /// Whether position/normal buffers are shared across instances.
    pub fn is_shared(self) -> bool {
        matches!(self, Self::SharedSeparate | Self::SharedJoint)
    }

    /// Whether position and normal data live in one combined buffer.
    pub fn is_joint(self) -> bool {
        matches!(self, Self::UnsharedJoint | Self::SharedJoint)
    }
}

/// Draw-call style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawStyle {
    /// `da` — one non-indexed draw over a flattened vertex stream.
    #[default]
    Arrays,
    /// `de` — one indexed draw over a compact corner-vertex set.
    Elements,
    /// `ds` — recognized but not implemented; degrades to the Arrays path.
    Strips,
}

/// Memory packing of a combined position+normal buffer. Only meaningful
/// for the joint sharing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackingMode {
    /// `ab` — all positions, then all normals.
    #[default]
    Blocked,
    /// `ai` — position/normal pairs alternating per vertex.
    Interleaved,
}

/// Declared component count for vertex attributes at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordWidth {
    /// `c3` — attributes are read at their natural width.
    #[default]
    Three,
    /// `c4` — separate-buffer attributes are declared 4-wide at bind
    /// time, whatever width the uploaded data actually has.
    Four,
}

/// Where the projection/view/scene matrix chain is multiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionMode {
    /// `mc` — composed on the host, uploaded as one matrix.
    #[default]
    Host,
    /// `mg` — uploaded unmultiplied, composed per-vertex in the shader.
    Device,
}

/// Immutable layout configuration, parsed once at startup and passed by
/// reference into the planner and every instance constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutConfig {
    pub sharing: SharingMode,
    pub draw: DrawStyle,
    pub packing: PackingMode,
    pub coord_width: CoordWidth,
    pub composition: CompositionMode,
    /// `tb` — texture coordinates; recognized but inert in this harness.
    pub texture_coords: bool,
    /// `rb` — batch run: stop after a fixed number of timing reports.
    pub batch: bool,
}

impl LayoutConfig {
    /// Parse a configuration code. Never fails: unrecognized tokens are
    /// reported once and skipped, and missing axes keep their defaults.
    pub fn parse(code: &str) -> Self {
        let mut config = Self::default();
        let mut ignored: Vec<&str> = Vec::new();

        for token in code.split('.').filter(|t| !t.is_empty()) {
            match token {
                "bua" => config.sharing = SharingMode::UnsharedSeparate,
                "bsa" => config.sharing = SharingMode::SharedSeparate,
                "buj" => config.sharing = SharingMode::UnsharedJoint,
                "bsj" => config.sharing = SharingMode::SharedJoint,
                "da" => config.draw = DrawStyle::Arrays,
                "de" => config.draw = DrawStyle::Elements,
                "ds" => config.draw = DrawStyle::Strips,
                "ab" => config.packing = PackingMode::Blocked,
                "ai" => config.packing = PackingMode::Interleaved,
                "c3" => config.coord_width = CoordWidth::Three,
                "c4" => config.coord_width = CoordWidth::Four,
                "mc" => config.composition = CompositionMode::Host,
                "mg" => config.composition = CompositionMode::Device,
                "tb" => config.texture_coords = true,
                "rb" => config.batch = true,
                other => ignored.push(other),
            }
        }

        if !ignored.is_empty() {
            warn!("ignoring unrecognized layout tokens: {:?}", ignored);
        }
        config
    }
}

/// Parse an instance-count argument. An unparseable value is reported and
/// replaced with [`DEFAULT_INSTANCE_COUNT`] rather than rejected.
pub fn parse_instance_count(arg: &str) -> usize {
    match arg.parse::<usize>() {
        Ok(n) => n,
        Err(_) => {
            warn!(
                "instance count {:?} is not an integer; using default {}",
                arg, DEFAULT_INSTANCE_COUNT
            );
            DEFAULT_INSTANCE_COUNT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_code_round_trip() {
        let config = LayoutConfig::parse(DEFAULT_CONFIG_CODE);
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn test_parse_all_axes() {
        let config = LayoutConfig::parse("bsj.de.ai.c4.mg.tb.rb");
        assert_eq!(config.sharing, SharingMode::SharedJoint);
        assert_eq!(config.draw, DrawStyle::Elements);
        assert_eq!(config.packing, PackingMode::Interleaved);
        assert_eq!(config.coord_width, CoordWidth::Four);
        assert_eq!(config.composition, CompositionMode::Device);
        assert!(config.texture_coords);
        assert!(config.batch);
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let config = LayoutConfig::parse("bsa.zz.lf.de.");
        assert_eq!(config.sharing, SharingMode::SharedSeparate);
        assert_eq!(config.draw, DrawStyle::Elements);
        // Unrecognized axes keep their family defaults.
        assert_eq!(config.packing, PackingMode::Blocked);
        assert_eq!(config.composition, CompositionMode::Host);
    }

    #[test]
    fn test_later_tokens_win() {
        let config = LayoutConfig::parse("bua.bsj.da.de");
        assert_eq!(config.sharing, SharingMode::SharedJoint);
        assert_eq!(config.draw, DrawStyle::Elements);
    }

    #[test]
    fn test_empty_code_is_default() {
        assert_eq!(LayoutConfig::parse(""), LayoutConfig::default());
        assert_eq!(LayoutConfig::parse("..."), LayoutConfig::default());
    }

    #[test]
    fn test_sharing_axis_helpers() {
        assert!(!SharingMode::UnsharedSeparate.is_shared());
        assert!(!SharingMode::UnsharedSeparate.is_joint());
        assert!(SharingMode::SharedSeparate.is_shared());
        assert!(!SharingMode::SharedSeparate.is_joint());
        assert!(!SharingMode::UnsharedJoint.is_shared());
        assert!(SharingMode::UnsharedJoint.is_joint());
        assert!(SharingMode::SharedJoint.is_shared());
        assert!(SharingMode::SharedJoint.is_joint());
    }

    #[test]
    fn test_instance_count_fallback() {
        assert_eq!(parse_instance_count("250"), 250);
        assert_eq!(parse_instance_count("lots"), DEFAULT_INSTANCE_COUNT);
    }
}
