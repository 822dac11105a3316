pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Pads `text` with spaces on the right up to `width` display columns.
pub fn pad_right(text: &str, width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    let current = text.width();
    if current < width {
        format!("{text}{}", " ".repeat(width - current))
    } else {
        text.to_string()
    }
}
