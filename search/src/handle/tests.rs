use super::*;
use crate::test_support::{FakeFactory, dir_entries};
use common::{create, root};
use tempfile::TempDir;

mod common {
    use super::*;

    pub(super) fn root(temp: &TempDir) -> PathBuf {
        temp.path().join("indexes")
    }

    pub(super) fn create(temp: &TempDir, factory: &FakeFactory, name: &str) -> IndexHandle {
        IndexHandle::create(name, &root(temp), factory, DocumentMapping::default()).unwrap()
    }
}

mod create {
    use super::*;

    #[test]
    fn test_allocates_directory_under_missing_root() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();

        let handle = create(&temp, &factory, "books");

        assert!(handle.path().is_dir());
        assert_eq!(handle.path().parent(), Some(root(&temp).as_path()));
        assert_eq!(handle.name(), "books");
        assert!(handle.with_source());
        assert_eq!(factory.paths(), vec![handle.path().to_path_buf()]);
    }

    #[test]
    fn test_directory_prefix_is_sanitized() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();

        let handle = create(&temp, &factory, "my index/../x");

        let dir_name = handle.path().file_name().unwrap().to_str().unwrap();
        assert!(
            dir_name.starts_with("kvfts-idx-my_index____x-"),
            "{dir_name}"
        );
    }

    #[test]
    fn test_long_names_are_truncated_in_prefix() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let name = "n".repeat(200);

        let handle = create(&temp, &factory, &name);

        assert_eq!(handle.name(), name);
        let dir_name = handle.path().file_name().unwrap().to_str().unwrap();
        let expected = format!("kvfts-idx-{}-", "n".repeat(MAX_PREFIX_NAME_LEN));
        assert!(dir_name.starts_with(&expected));
    }

    #[test]
    fn test_same_name_gets_distinct_directories() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();

        let first = create(&temp, &factory, "dup");
        let second = create(&temp, &factory, "dup");

        assert_ne!(first.path(), second.path());
        assert_eq!(dir_entries(&root(&temp)), 2);
    }

    #[test]
    fn test_engine_failure_removes_directory() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::failing_create();

        let result =
            IndexHandle::create("broken", &root(&temp), &factory, DocumentMapping::default());

        assert!(matches!(result, Err(HandleError::Engine(_))));
        assert_eq!(dir_entries(&root(&temp)), 0);
    }
}

mod release {
    use super::*;

    #[test]
    fn test_closes_engine_and_removes_directory() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mut handle = create(&temp, &factory, "idx");
        let path = handle.path().to_path_buf();

        handle.release();

        assert!(handle.is_released());
        assert_eq!(factory.closed(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mut handle = create(&temp, &factory, "idx");
        let path = handle.path().to_path_buf();

        handle.release();
        // A second release must not remove the directory again.
        std::fs::create_dir(&path).unwrap();
        handle.release();
        drop(handle);

        assert_eq!(factory.closed(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_close_failure_still_removes_directory() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::failing_close();
        let mut handle = create(&temp, &factory, "idx");
        let path = handle.path().to_path_buf();

        handle.release();

        assert_eq!(factory.closed(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_directory_is_tolerated() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mut handle = create(&temp, &factory, "idx");
        std::fs::remove_dir_all(handle.path()).unwrap();

        handle.release();

        assert_eq!(factory.closed(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let handle = create(&temp, &factory, "idx");
        let path = handle.path().to_path_buf();

        drop(handle);

        assert_eq!(factory.closed(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_operations_after_release_fail() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mut handle = create(&temp, &factory, "idx");

        handle.release();

        assert!(matches!(handle.index("d1", "x"), Err(HandleError::Released)));
        assert!(matches!(handle.search("x"), Err(HandleError::Released)));
        assert!(matches!(handle.doc_count(), Err(HandleError::Released)));
    }
}

mod documents {
    use super::*;

    #[test]
    fn test_forwards_to_engine() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mut handle = create(&temp, &factory, "idx");

        handle.index("d1", "hello world").unwrap();
        handle.index("d2", "hello there").unwrap();
        handle.delete("d2").unwrap();

        assert_eq!(handle.search("hello").unwrap(), vec!["d1".to_string()]);
        assert_eq!(handle.doc_count().unwrap(), 1);
        assert_eq!(
            handle.get_stored("d1").unwrap(),
            Some(b"hello world".to_vec())
        );
    }

    #[test]
    fn test_get_stored_without_source_is_none() {
        let temp = TempDir::new().unwrap();
        let factory = FakeFactory::new();
        let mapping = DocumentMapping {
            store_source: false,
        };
        let mut handle = IndexHandle::create("idx", &root(&temp), &factory, mapping).unwrap();

        handle.index("d1", "hello").unwrap();

        assert!(!handle.with_source());
        assert_eq!(handle.get_stored("d1").unwrap(), None);
    }
}
