use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

const INITIAL_RADIUS: f32 = 10.0;

pub fn quantile(sorted: &[f32], p: f32) -> Option<f32> {
    let (&first, &last) = (sorted.first()?, sorted.last()?);
    if p <= 0.0 || sorted.len() < 2 {
        return Some(first);
    }
    if p >= 1.0 {
        return Some(last);
    }

    let position = (sorted.len() - 1) as f32 * p;
    let lower = position.floor() as usize;
    let lower_value = sorted[lower];
    let upper_value = sorted[(lower + 1).min(sorted.len() - 1)];
    Some(lower_value + (upper_value - lower_value) * (position - lower as f32))
}

pub fn sorted_values(values: impl IntoIterator<Item = f32>) -> Vec<f32> {
    let mut values = values.into_iter().collect::<Vec<_>>();
    values.sort_by(f32::total_cmp);
    values
}

pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn phyllotaxis(index: usize) -> Vec2 {
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    vec2(radius * angle.cos(), radius * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_between_neighbours() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.9), Some(7.0));
    }

    #[test]
    fn phyllotaxis_points_are_distinct() {
        let first = phyllotaxis(0);
        let second = phyllotaxis(1);
        assert!((first - second).length() > 1.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_hundredths(1.0 / 60.0), 0.02);
        assert_eq!(round_hundredths(2.5), 2.5);
    }
}
