use depot_storage::{
    CachedArtifact, ContentHash, Coordinate, ExternalArtifactCache, FileStore, Publish, TemporaryFileProvider,
};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

fn lib() -> Coordinate {
    Coordinate::new("org.example", "lib", "1.0", "jar", "lib")
        .unwrap()
        .with_extension("jar")
        .unwrap()
}

fn stage(store: &FileStore, content: &[u8]) -> PathBuf {
    let (path, mut file) = store.create_staging_file(["downloads"]).unwrap();
    file.write_all(content).unwrap();
    path
}

#[test]
fn publish_then_probe() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let first = store.add(&lib(), stage(&store, b"hello")).unwrap();
    let expected = dir
        .path()
        .join("org.example/lib/1.0/jar")
        .join(ContentHash::of_bytes(b"hello").as_str())
        .join("lib-1.0.jar");
    assert_eq!(first, Publish::Added(expected));

    let second = store.add(&lib(), stage(&store, b"hello")).unwrap();
    assert_eq!(second, Publish::AlreadyPresent(first.path().to_path_buf()));

    let other = store.add(&lib(), stage(&store, b"goodbye")).unwrap();
    assert!(other.is_new());

    let candidates: Vec<CachedArtifact> = store.probe(&lib()).collect::<Result<_, _>>().unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().any(|c| c.matches(&ContentHash::of_bytes(b"hello"))));
    assert!(candidates.iter().any(|c| c.matches(&ContentHash::of_bytes(b"goodbye"))));
}

#[test]
fn concurrent_identical_adds_store_one_file() {
    const THREADS: usize = 16;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let staged: Vec<PathBuf> = (0..THREADS).map(|_| stage(&store, b"same bytes")).collect();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = staged
        .into_iter()
        .map(|path| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let published = store.add(&lib(), &path).unwrap();
                assert!(!path.exists());
                published
            })
        })
        .collect();
    let results: Vec<Publish> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let destination = results[0].path().to_path_buf();
    assert!(results.iter().all(|r| r.path() == destination));
    assert!(results.iter().any(Publish::is_new));
    assert_eq!(fs::read(&destination).unwrap(), b"same bytes");
    assert_eq!(store.probe(&lib()).count(), 1);
    // Every staged file was consumed.
    assert_eq!(fs::read_dir(store.staging_dir().join("downloads")).unwrap().count(), 0);
}

#[test]
fn temporary_files_can_be_published() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let provider: TemporaryFileProvider = store.temporary_files();

    let path = provider.create_temporary_file("dl-", Some(".part"), ["http"]).unwrap();
    fs::write(&path, b"payload").unwrap();
    let published = store.add(&lib(), &path).unwrap();

    assert!(published.is_new());
    assert!(published.path().starts_with(dir.path().join("org.example")));
    assert!(!path.exists());
}

#[test]
fn staging_never_collides_with_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    store.add(&lib(), stage(&store, b"x")).unwrap();

    // Leftover staging files must not show up as stored artifacts.
    let _orphan = stage(&store, b"y");
    assert_eq!(store.probe(&lib()).count(), 1);
}
