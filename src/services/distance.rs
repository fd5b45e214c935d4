use crate::{
    error::{AppError, AppResult},
    models::Item,
};

/// Widest production-year gap in the catalog, `None` for an empty catalog
pub fn max_year_distance(items: &[Item]) -> Option<u32> {
    let min = items.iter().map(Item::year).min()?;
    let max = items.iter().map(Item::year).max()?;
    Some(min.abs_diff(max))
}

/// Closeness of two items' production years, normalized by the corpus maximum.
///
/// Identical years score 1.0 and the most distant pair in the corpus scores
/// 0.0. A zero `max_distance` means every item shares one year; that is
/// reported as `InvalidInput` and callers score such pairs as 1.0.
pub fn attribute_distance(a: &Item, b: &Item, max_distance: u32) -> AppResult<f64> {
    if max_distance == 0 {
        return Err(AppError::InvalidInput(
            "Normalization distance must be positive".to_string(),
        ));
    }

    let gap = a.year().abs_diff(b.year()) as f64;
    let score = 1.0 - gap / max_distance as f64;
    Ok(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, year: i32) -> Item {
        Item::new(id, format!("Film {}", id), year).unwrap()
    }

    #[test]
    fn test_max_year_distance() {
        let items = vec![item(1, 1990), item(2, 1975), item(3, 2010)];
        assert_eq!(max_year_distance(&items), Some(35));
        assert_eq!(max_year_distance(&[]), None);
        assert_eq!(max_year_distance(&[item(1, 2000)]), Some(0));
    }

    #[test]
    fn test_extremes() {
        let oldest = item(1, 1975);
        let newest = item(2, 2010);
        assert_eq!(attribute_distance(&oldest, &newest, 35).unwrap(), 0.0);
        assert_eq!(attribute_distance(&oldest, &oldest, 35).unwrap(), 1.0);
    }

    #[test]
    fn test_is_symmetric() {
        let a = item(1, 1990);
        let b = item(2, 2000);
        let ab = attribute_distance(&a, &b, 40).unwrap();
        let ba = attribute_distance(&b, &a, 40).unwrap();
        assert_eq!(ab, ba);
        assert!((ab - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_normalization_rejected() {
        let a = item(1, 2000);
        assert!(matches!(
            attribute_distance(&a, &a, 0),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stale_maximum_is_clamped() {
        // Items outside the range the maximum was computed over
        let a = item(1, 1900);
        let b = item(2, 2000);
        assert_eq!(attribute_distance(&a, &b, 10).unwrap(), 0.0);
    }
}
