//! Human-readable names for attribute codes and terminal rendering.

use std::io::{self, BufRead, Write};

use crate::{FeatureCatalog, MushroomModel};

/// Provenance of the mushroom records the attribute tables describe.
pub const DATASET_SOURCE: &str =
    "UCI Machine Learning Repository, donated by the National Audubon Society (1987)";

type CodeTable = &'static [(&'static str, &'static str)];

const COLORS: CodeTable = &[
    ("n", "Brown"),
    ("b", "Buff"),
    ("c", "Cinnamon"),
    ("g", "Gray"),
    ("o", "Orange"),
    ("p", "Pink"),
    ("e", "Red"),
    ("w", "White"),
    ("y", "Yellow"),
];

const SURFACES: CodeTable = &[
    ("f", "Fibrous"),
    ("y", "Scaly"),
    ("k", "Silky"),
    ("s", "Smooth"),
];

/// Attribute code → display string, per feature.
pub static FEATURE_LABELS: &[(&str, CodeTable)] = &[
    (
        "cap-shape",
        &[
            ("b", "Bell"),
            ("c", "Conical"),
            ("x", "Convex"),
            ("f", "Flat"),
            ("k", "Knobbed"),
            ("s", "Sunken"),
        ],
    ),
    (
        "cap-surface",
        &[
            ("f", "Fibrous"),
            ("g", "Grooves"),
            ("y", "Scaly"),
            ("s", "Smooth"),
        ],
    ),
    (
        "cap-color",
        &[
            ("n", "Brown"),
            ("b", "Buff"),
            ("c", "Cinnamon"),
            ("g", "Gray"),
            ("r", "Green"),
            ("p", "Pink"),
            ("u", "Purple"),
            ("e", "Red"),
            ("w", "White"),
            ("y", "Yellow"),
        ],
    ),
    ("bruises", &[("t", "Bruises"), ("f", "No Bruises")]),
    (
        "odor",
        &[
            ("a", "Almond"),
            ("l", "Anise"),
            ("c", "Creosote"),
            ("y", "Fishy"),
            ("f", "Foul"),
            ("m", "Musty"),
            ("n", "None"),
            ("p", "Pungent"),
            ("s", "Spicy"),
        ],
    ),
    ("gill-attachment", &[("a", "Attached"), ("f", "Free")]),
    ("gill-spacing", &[("c", "Close"), ("w", "Crowded")]),
    ("gill-size", &[("b", "Broad"), ("n", "Narrow")]),
    (
        "gill-color",
        &[
            ("k", "Black"),
            ("n", "Brown"),
            ("b", "Buff"),
            ("h", "Chocolate"),
            ("g", "Gray"),
            ("r", "Green"),
            ("o", "Orange"),
            ("p", "Pink"),
            ("u", "Purple"),
            ("e", "Red"),
            ("w", "White"),
            ("y", "Yellow"),
        ],
    ),
    ("stalk-shape", &[("e", "Enlarging"), ("t", "Tapering")]),
    (
        "stalk-root",
        &[
            ("b", "Bulbous"),
            ("c", "Club"),
            ("e", "Equal"),
            ("r", "Rooted"),
            ("?", "Missing"),
        ],
    ),
    ("stalk-surface-above-ring", SURFACES),
    ("stalk-surface-below-ring", SURFACES),
    ("stalk-color-above-ring", COLORS),
    ("stalk-color-below-ring", COLORS),
    ("veil-type", &[("p", "Partial")]),
    (
        "veil-color",
        &[("n", "Brown"), ("o", "Orange"), ("w", "White"), ("y", "Yellow")],
    ),
    ("ring-number", &[("n", "None"), ("o", "One"), ("t", "Two")]),
    (
        "ring-type",
        &[
            ("e", "Evanescent"),
            ("f", "Flaring"),
            ("l", "Large"),
            ("n", "None"),
            ("p", "Pendant"),
        ],
    ),
    (
        "spore-print-color",
        &[
            ("k", "Black"),
            ("n", "Brown"),
            ("b", "Buff"),
            ("h", "Chocolate"),
            ("r", "Green"),
            ("o", "Orange"),
            ("u", "Purple"),
            ("w", "White"),
            ("y", "Yellow"),
        ],
    ),
    (
        "population",
        &[
            ("a", "Abundant"),
            ("c", "Clustered"),
            ("n", "Numerous"),
            ("s", "Scattered"),
            ("v", "Several"),
            ("y", "Solitary"),
        ],
    ),
    (
        "habitat",
        &[
            ("g", "Grasses"),
            ("l", "Leaves"),
            ("m", "Meadows"),
            ("p", "Paths"),
            ("u", "Urban"),
            ("w", "Waste"),
            ("d", "Woods"),
        ],
    ),
];

fn table(feature: &str) -> Option<CodeTable> {
    FEATURE_LABELS
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, codes)| *codes)
}

/// Display string for an attribute code, or the code itself if unmapped.
pub fn display_value<'a>(feature: &str, code: &'a str) -> &'a str {
    table(feature)
        .and_then(|codes| codes.iter().find(|(c, _)| *c == code))
        .map_or(code, |(_, label)| *label)
}

/// Attribute code for a display string (case-insensitive), or the input if unmapped.
pub fn code_for_display<'a>(feature: &str, text: &'a str) -> &'a str {
    table(feature)
        .and_then(|codes| {
            codes
                .iter()
                .find(|(_, label)| label.eq_ignore_ascii_case(text))
        })
        .map_or(text, |(code, _)| *code)
}

/// `stalk-surface-above-ring` → `Stalk Surface Above Ring`.
pub fn feature_title(feature: &str) -> String {
    feature
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `odor_n` → `Odor: None`. Names without a known feature prefix are returned unchanged.
pub fn decode_feature_name(encoded: &str) -> String {
    let Some((feature, code)) = encoded.split_once('_') else {
        return encoded.to_string();
    };
    if table(feature).is_none() {
        return encoded.to_string();
    }
    format!("{}: {}", feature_title(feature), display_value(feature, code))
}

/// Horizontal bar chart of `(encoded-name, score)` pairs, first pair on top.
pub fn render_importance_chart(pairs: &[(String, f64)], width: usize) -> String {
    let labels: Vec<String> = pairs.iter().map(|(name, _)| decode_feature_name(name)).collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = pairs.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (label, (_, score)) in labels.iter().zip(pairs) {
        let len = if max > 0.0 {
            ((score / max) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{label:>label_width$} | {bar:<width$} {score:.4}\n",
            bar = "█".repeat(len),
        ));
    }
    out
}

/// Dashboard text: dataset, accuracy, held-out counts and the importance chart.
pub fn render_summary(model: &MushroomModel, top: usize) -> String {
    let confusion = model.confusion();
    let mut out = String::new();
    out.push_str("Model status:  trained\n");
    out.push_str(&format!("Dataset:       {} samples\n", model.sample_count()));
    out.push_str(&format!("Source:        {DATASET_SOURCE}\n"));
    out.push_str(&format!(
        "Classifier:    decision tree ({} columns)\n",
        model.schema().len()
    ));
    out.push_str(&format!("✅ Accuracy:    {}\n", model.accuracy_percent()));
    out.push_str(&format!(
        "Held out:      {} edible ✓, {} poisonous ✓, {} poisonous called edible, {} edible called poisonous\n",
        confusion.true_edible,
        confusion.true_poisonous,
        confusion.false_edible,
        confusion.false_poisonous
    ));
    out.push_str(&format!("\nTop {top} feature importances:\n"));
    out.push_str(&render_importance_chart(&model.feature_importances(top), 40));
    out
}

/// Result of prompting for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Code(String),
    Exit,
}

/// Shows a numbered menu for `feature` and reads a selection.
///
/// Accepts an option number, a display string, or a raw code. An empty line
/// picks the first option. `exit` or end of input returns [`Choice::Exit`].
pub fn prompt_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    feature: &str,
    options: &[String],
) -> io::Result<Choice> {
    writeln!(output, "{}:", feature_title(feature))?;
    for (i, code) in options.iter().enumerate() {
        writeln!(output, "  {:>2}) {}", i + 1, display_value(feature, code))?;
    }

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Choice::Exit);
        }
        let line = line.trim();

        if line.eq_ignore_ascii_case("exit") {
            return Ok(Choice::Exit);
        }
        if line.is_empty() {
            if let Some(first) = options.first() {
                return Ok(Choice::Code(first.clone()));
            }
        }
        if let Ok(n) = line.parse::<usize>() {
            if let Some(code) = n.checked_sub(1).and_then(|i| options.get(i)) {
                return Ok(Choice::Code(code.clone()));
            }
        }
        let code = code_for_display(feature, line);
        if options.iter().any(|o| o == code) {
            return Ok(Choice::Code(code.to_string()));
        }

        writeln!(output, "Unknown option `{line}`, pick 1-{}", options.len())?;
    }
}

/// Prompts for every feature in the catalog. `None` when the user exits.
pub fn prompt_record<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    catalog: &FeatureCatalog,
) -> io::Result<Option<Vec<(String, String)>>> {
    let mut record = Vec::with_capacity(catalog.len());
    for (feature, options) in catalog.iter() {
        match prompt_choice(input, output, feature, options)? {
            Choice::Code(code) => record.push((feature.to_string(), code)),
            Choice::Exit => return Ok(None),
        }
    }
    Ok(Some(record))
}
