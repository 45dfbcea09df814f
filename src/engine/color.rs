//! Color harmony scoring in CIELAB space.
//!
//! Color names are resolved through a lookup table of common clothing colors,
//! converted sRGB → linear RGB → XYZ (D65) → Lab, and compared with the
//! CIEDE2000 perceptual distance. The harmony score of an outfit palette is
//! the mean pairwise distance, normalized and inverted so well-coordinated
//! (perceptually close) palettes score high.
//!
//! Unknown color names are recovered locally: nearest lexical match first
//! ("light blue" resolves through "blue"), neutral gray as the last resort.
//! Never fatal.

/// A CIELAB coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Common clothing color names → sRGB. Multi-word fashion names included so
/// lexical fallback rarely fires.
const COLOR_TABLE: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("charcoal", [54, 69, 79]),
    ("silver", [192, 192, 192]),
    ("red", [205, 33, 42]),
    ("maroon", [128, 0, 0]),
    ("burgundy", [128, 0, 32]),
    ("crimson", [220, 20, 60]),
    ("pink", [255, 192, 203]),
    ("salmon", [250, 128, 114]),
    ("orange", [255, 140, 0]),
    ("rust", [183, 65, 14]),
    ("coral", [255, 127, 80]),
    ("yellow", [240, 220, 80]),
    ("mustard", [225, 173, 1]),
    ("gold", [212, 175, 55]),
    ("green", [60, 140, 70]),
    ("olive", [107, 112, 57]),
    ("forest green", [34, 85, 51]),
    ("mint", [152, 221, 183]),
    ("sage", [158, 169, 136]),
    ("teal", [0, 128, 128]),
    ("turquoise", [64, 224, 208]),
    ("blue", [60, 100, 180]),
    ("navy", [30, 40, 80]),
    ("royal blue", [65, 105, 225]),
    ("sky blue", [135, 206, 235]),
    ("light blue", [173, 216, 230]),
    ("denim", [60, 90, 140]),
    ("indigo", [75, 0, 130]),
    ("purple", [128, 80, 160]),
    ("lavender", [181, 166, 219]),
    ("violet", [143, 94, 173]),
    ("brown", [120, 80, 50]),
    ("chocolate", [90, 58, 34]),
    ("tan", [180, 150, 110]),
    ("camel", [193, 154, 107]),
    ("khaki", [189, 175, 132]),
    ("beige", [225, 210, 180]),
    ("cream", [245, 240, 220]),
    ("ivory", [250, 246, 230]),
    ("off-white", [242, 240, 230]),
];

/// Neutral fallback when a color name cannot be resolved at all.
const NEUTRAL_GRAY: [u8; 3] = [128, 128, 128];

/// Resolve a color name to Lab.
///
/// Resolution order: exact table hit, then nearest lexical match (either
/// string contains the other; longest table key wins), then neutral gray.
pub fn lab_for_name(name: &str) -> Lab {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return rgb_to_lab(NEUTRAL_GRAY);
    }
    if let Some(&(_, rgb)) = COLOR_TABLE.iter().find(|(key, _)| *key == needle) {
        return rgb_to_lab(rgb);
    }

    // Nearest lexical match: prefer the longest key related by containment.
    let mut best: Option<(&str, [u8; 3])> = None;
    for &(key, rgb) in COLOR_TABLE {
        if needle.contains(key) || key.contains(needle.as_str()) {
            if best.map(|(b, _)| key.len() > b.len()).unwrap_or(true) {
                best = Some((key, rgb));
            }
        }
    }
    match best {
        Some((key, rgb)) => {
            tracing::debug!(name = %needle, resolved = key, "color resolved by lexical fallback");
            rgb_to_lab(rgb)
        }
        None => {
            tracing::warn!(name = %needle, "unknown color, using neutral gray");
            rgb_to_lab(NEUTRAL_GRAY)
        }
    }
}

/// CIEDE2000 distance between two color names.
pub fn distance(a: &str, b: &str) -> f64 {
    delta_e2000(lab_for_name(a), lab_for_name(b))
}

/// Harmony score in [0, 1] for a palette of color names.
///
/// Fewer than two colors yields the neutral maximum 1.0 — a single color
/// cannot clash with itself. Otherwise the mean pairwise CIEDE2000 distance
/// (empirically 0–100 for clothing palettes) is mapped so small distances
/// score high.
pub fn harmony(colors: &[&str]) -> f64 {
    if colors.len() < 2 {
        return 1.0;
    }
    let labs: Vec<Lab> = colors.iter().map(|c| lab_for_name(c)).collect();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..labs.len() {
        for j in (i + 1)..labs.len() {
            total += delta_e2000(labs[i], labs[j]);
            pairs += 1;
        }
    }
    let mean = total / pairs as f64;
    (1.0 - mean / 100.0).clamp(0.0, 1.0)
}

/// sRGB (0–255) → Lab under D65.
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    // Linearize sRGB
    let linear = rgb.map(|c| {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    });
    let [r, g, b] = linear;

    // Linear RGB → XYZ (D65)
    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    // XYZ → Lab, D65 reference white
    let f = |t: f64| {
        const DELTA: f64 = 6.0 / 29.0;
        if t > DELTA.powi(3) {
            t.cbrt()
        } else {
            t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
        }
    };
    let fx = f(x / 0.95047);
    let fy = f(y / 1.0);
    let fz = f(z / 1.08883);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// CIEDE2000 color difference (Sharma et al. 2005 formulation).
pub fn delta_e2000(c1: Lab, c2: Lab) -> f64 {
    let (l1, a1, b1) = (c1.l, c1.a, c1.b);
    let (l2, a2, b2) = (c2.l, c2.a, c2.b);

    let chroma1 = (a1 * a1 + b1 * b1).sqrt();
    let chroma2 = (a2 * a2 + b2 * b2).sqrt();
    let chroma_mean = (chroma1 + chroma2) / 2.0;

    let g = 0.5 * (1.0 - (chroma_mean.powi(7) / (chroma_mean.powi(7) + 25f64.powi(7))).sqrt());
    let a1p = (1.0 + g) * a1;
    let a2p = (1.0 + g) * a2;

    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();

    let h1p = hue_angle(b1, a1p);
    let h2p = hue_angle(b2, a2p);

    let dl = l2 - l1;
    let dc = c2p - c1p;

    let dhp = if c1p * c2p == 0.0 {
        0.0
    } else {
        let mut d = h2p - h1p;
        if d > 180.0 {
            d -= 360.0;
        } else if d < -180.0 {
            d += 360.0;
        }
        d
    };
    let dh = 2.0 * (c1p * c2p).sqrt() * (dhp.to_radians() / 2.0).sin();

    let lp_mean = (l1 + l2) / 2.0;
    let cp_mean = (c1p + c2p) / 2.0;

    let hp_mean = if c1p * c2p == 0.0 {
        h1p + h2p
    } else {
        let sum = h1p + h2p;
        let diff = (h1p - h2p).abs();
        if diff <= 180.0 {
            sum / 2.0
        } else if sum < 360.0 {
            (sum + 360.0) / 2.0
        } else {
            (sum - 360.0) / 2.0
        }
    };

    let t = 1.0 - 0.17 * (hp_mean - 30.0).to_radians().cos()
        + 0.24 * (2.0 * hp_mean).to_radians().cos()
        + 0.32 * (3.0 * hp_mean + 6.0).to_radians().cos()
        - 0.20 * (4.0 * hp_mean - 63.0).to_radians().cos();

    let sl = 1.0 + (0.015 * (lp_mean - 50.0).powi(2)) / (20.0 + (lp_mean - 50.0).powi(2)).sqrt();
    let sc = 1.0 + 0.045 * cp_mean;
    let sh = 1.0 + 0.015 * cp_mean * t;

    let d_theta = 30.0 * (-((hp_mean - 275.0) / 25.0).powi(2)).exp();
    let rc = 2.0 * (cp_mean.powi(7) / (cp_mean.powi(7) + 25f64.powi(7))).sqrt();
    let rt = -rc * (2.0 * d_theta.to_radians()).sin();

    ((dl / sl).powi(2)
        + (dc / sc).powi(2)
        + (dh / sh).powi(2)
        + rt * (dc / sc) * (dh / sh))
        .sqrt()
}

/// Hue angle in degrees, normalized to [0, 360).
fn hue_angle(b: f64, ap: f64) -> f64 {
    if b == 0.0 && ap == 0.0 {
        return 0.0;
    }
    let h = b.atan2(ap).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}
