// Smallest index in [low, high) whose key is >= target, or high if none.
// Keys must be ascending over the range.
pub fn lower_bound<T, K, F>(items: &[T], low: usize, high: usize, target: K, key_fn: F) -> usize
    where K: PartialOrd, F: Fn(&T) -> K {

    let mut low_index = low;
    let mut high_index = high;
    while low_index < high_index {
        let mid = low_index + (high_index - low_index) / 2;
        if key_fn(&items[mid]) < target {
            low_index = mid + 1;
        }else{
            high_index = mid;
        }
    }
    low_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound() {
        let positions = vec![5u32, 20, 35, 50];
        assert_eq!(lower_bound(&positions, 0, positions.len(), 19, |v| *v), 1);
        assert_eq!(lower_bound(&positions, 0, positions.len(), 20, |v| *v), 1);
        assert_eq!(lower_bound(&positions, 0, positions.len(), 1, |v| *v), 0);
        assert_eq!(lower_bound(&positions, 0, positions.len(), 51, |v| *v), 4);
        // search starts from a cursor, never rewinds
        assert_eq!(lower_bound(&positions, 2, positions.len(), 1, |v| *v), 2);
    }
}
