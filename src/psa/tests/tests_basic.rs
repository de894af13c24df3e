#[cfg(test)]
mod tests {
    use crate::psa::{HEADER_SIZE, PersistentSortedArray, RECORD_SIZE};
    use tempfile::TempDir;
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn open_creates_file_with_zero_header() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("level0");

        let psa = PersistentSortedArray::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(psa.len().unwrap(), 0);
        assert!(psa.is_empty().unwrap());
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            HEADER_SIZE,
            "fresh file holds only the length prefix"
        );
    }

    #[test]
    fn push_then_get() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let mut psa = PersistentSortedArray::open(tmp.path().join("level0")).unwrap();

        psa.push(10).unwrap();
        psa.push(20).unwrap();
        psa.push(30).unwrap();

        assert_eq!(psa.len().unwrap(), 3);
        assert_eq!(psa.get(0).unwrap(), 10);
        assert_eq!(psa.get(1).unwrap(), 20);
        assert_eq!(psa.get(2).unwrap(), 30);
    }

    #[test]
    fn set_overwrites_in_place() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let mut psa = PersistentSortedArray::open(tmp.path().join("level0")).unwrap();

        psa.push(1).unwrap();
        psa.push(2).unwrap();
        psa.push(3).unwrap();

        psa.set(1, 99).unwrap();

        assert_eq!(psa.len().unwrap(), 3, "set must not change the length");
        assert_eq!(psa.get(0).unwrap(), 1);
        assert_eq!(psa.get(1).unwrap(), 99);
        assert_eq!(psa.get(2).unwrap(), 3);
    }

    #[test]
    fn on_disk_layout_is_little_endian() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("level0");
        let mut psa = PersistentSortedArray::open(&path).unwrap();

        psa.push(0x0102030405060708).unwrap();
        psa.push(u64::MAX).unwrap();
        psa.sync().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_SIZE + 2 * RECORD_SIZE);
        assert_eq!(&bytes[0..8], &2u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &0x0102030405060708u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &u64::MAX.to_le_bytes());
    }

    #[test]
    fn clear_zeroes_only_the_header() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("level0");
        let mut psa = PersistentSortedArray::open(&path).unwrap();

        psa.push(7).unwrap();
        psa.push(8).unwrap();
        psa.clear().unwrap();

        assert_eq!(psa.len().unwrap(), 0);
        assert!(psa.is_empty().unwrap());
        // The record bytes stay behind as an ignored tail.
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            HEADER_SIZE + 2 * RECORD_SIZE
        );
    }
}
