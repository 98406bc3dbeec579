//! Chart colors and value formatting.

use plotters::style::RGBColor;

pub const FIGURE_BG: RGBColor = RGBColor(248, 249, 250); // #f8f9fa
pub const PANEL_BG: RGBColor = RGBColor(245, 245, 245); // #f5f5f5
pub const LINE_PANEL_BG: RGBColor = RGBColor(253, 253, 253); // #fdfdfd
pub const GRID: RGBColor = RGBColor(176, 176, 176);
pub const TEXT: RGBColor = RGBColor(33, 33, 33);

pub const STACK_BOTTOM: RGBColor = RGBColor(234, 67, 53); // #EA4335
pub const STACK_TOP: RGBColor = RGBColor(66, 133, 244); // #4285F4
pub const LINE_COLOR: RGBColor = RGBColor(46, 134, 171); // #2E86AB

pub const PIE_COLORS: [RGBColor; 5] = [
    RGBColor(255, 158, 74),  // #ff9e4a
    RGBColor(102, 194, 165), // #66c2a5
    RGBColor(252, 141, 98),  // #fc8d62
    RGBColor(141, 160, 203), // #8da0cb
    RGBColor(231, 138, 195), // #e78ac3
];

/// Qualitative 20-color palette for per-year bars.
pub const TAB20: [RGBColor; 20] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

/// Viridis anchors at 0, 0.25, 0.5, 0.75, 1.
const VIRIDIS: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

/// Color `i` of `n` spread evenly across [`TAB20`].
pub fn tab20_spread(i: usize, n: usize) -> RGBColor {
    if n <= 1 {
        return TAB20[0];
    }
    let x = i as f64 / (n - 1) as f64;
    let idx = ((x * TAB20.len() as f64) as usize).min(TAB20.len() - 1);
    TAB20[idx]
}

/// Color `i` of `n` sampled from viridis between `lo` and `hi`.
pub fn viridis_spread(i: usize, n: usize, lo: f64, hi: f64) -> RGBColor {
    let t = if n <= 1 {
        lo
    } else {
        lo + (hi - lo) * i as f64 / (n - 1) as f64
    };
    viridis(t)
}

fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let segments = (VIRIDIS.len() - 1) as f64;
    let pos = t * segments;
    let lower = (pos.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = pos - lower as f64;

    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[lower + 1];
    let lerp = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// `$1,234,567` with no decimals.
pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(value.abs().round() as u64))
}

/// Compact axis label: `$1.2B`, `$350M`, `$12K`.
pub fn format_usd_short(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };

    let digits = if scaled >= 100.0 || scaled.fract() == 0.0 { 0 } else { 1 };
    format!("{}${:.*}{}", sign, digits, scaled, suffix)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_labels_group_thousands() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.4), "$999");
        assert_eq!(format_usd(1_000.0), "$1,000");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567");
        assert_eq!(format_usd(-25_000.0), "-$25,000");
    }

    #[test]
    fn short_labels_pick_a_unit() {
        assert_eq!(format_usd_short(0.0), "$0");
        assert_eq!(format_usd_short(12_000.0), "$12K");
        assert_eq!(format_usd_short(2_500_000.0), "$2.5M");
        assert_eq!(format_usd_short(350_000_000.0), "$350M");
        assert_eq!(format_usd_short(1_000_000_000.0), "$1B");
    }

    #[test]
    fn spreads_cover_the_palette_ends() {
        assert_eq!(tab20_spread(0, 5), TAB20[0]);
        assert_eq!(tab20_spread(4, 5), TAB20[19]);
        assert_eq!(tab20_spread(0, 1), TAB20[0]);

        assert_eq!(viridis_spread(0, 3, 0.0, 1.0), RGBColor(68, 1, 84));
        assert_eq!(viridis_spread(2, 3, 0.0, 1.0), RGBColor(253, 231, 37));
        assert_eq!(viridis_spread(1, 3, 0.0, 1.0), RGBColor(33, 145, 140));
    }
}
