//! Tests for the visited-vector record

#[cfg(test)]
mod tests {
    use tilesolve::solver::visited::VisitedSet;

    // Tests insertion reports novelty and counts revisits
    // Verified by always returning true
    #[test]
    fn test_insert_and_revisit() {
        let mut visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.insert(&[1, 2]));
        assert!(!visited.insert(&[1, 2]));
        assert!(visited.insert(&[2, 1]));
        assert_eq!(visited.len(), 2);
        assert_eq!(visited.stats.revisits, 1);
        assert_eq!(visited.stats.inserts, 2);
    }

    // Tests the searched flag is separate from membership
    // Verified by marking on insert
    #[test]
    fn test_searched_flag() {
        let mut visited = VisitedSet::new();
        visited.insert(&[4, 4]);
        assert!(visited.contains(&[4, 4]));
        assert!(!visited.is_searched(&[4, 4]));

        visited.mark_searched(&[4, 4]);
        assert!(visited.is_searched(&[4, 4]));
        assert_eq!(visited.len(), 1);
    }

    // Tests marking an unseen vector inserts it
    // Verified by ignoring unknown vectors
    #[test]
    fn test_mark_unseen() {
        let mut visited = VisitedSet::new();
        visited.mark_searched(&[9]);
        assert!(visited.contains(&[9]));
        assert!(visited.is_searched(&[9]));
        assert!(!visited.is_searched(&[8]));
    }
}
