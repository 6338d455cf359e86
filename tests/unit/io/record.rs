//! Tests for the host tiling record

#[cfg(test)]
mod tests {
    use tilesolve::io::record::TilingRecord;

    // Tests fields read back what was written
    // Verified by ignoring overwrites
    #[test]
    fn test_get_set() {
        let mut record = TilingRecord::new();
        assert!(record.is_empty());
        record.set("base_m", 128);
        record.set("base_m", 256);
        assert_eq!(record.get("base_m"), Some(256));
        assert_eq!(record.get("base_n"), None);
        assert_eq!(record.len(), 1);
    }

    // Tests 32-bit accessors reject missing and oversized fields
    // Verified by truncating instead of failing
    #[test]
    fn test_u32_accessors() {
        let mut record = TilingRecord::new();
        record.set_u32("cores", 24);
        record.set("huge", u64::from(u32::MAX) + 1);
        assert_eq!(record.get_u32("cores").ok(), Some(24));
        assert!(record.get_u32("huge").is_err());
        assert!(record.get_u32("missing").is_err());
    }

    // Tests rendering lists the key first, then fields in name order
    // Verified by rendering in insertion order
    #[test]
    fn test_display_order() {
        let mut record = TilingRecord::new();
        record.set("step_m", 2);
        record.set("base_m", 1);
        record.set_tiling_key(10);
        assert_eq!(record.tiling_key(), Some(10));
        assert_eq!(record.to_string(), "tiling_key = 10\nbase_m = 1\nstep_m = 2\n");
    }
}
