// Property suite every term backend must pass
// Each check runs against both the in-memory and the SQLite backend

use ranked_terms::{BackendKind, MemoryBackend, SqliteBackend, TermBackend, TermRecord};
use tempfile::TempDir;

const MAX_ENTRIES: usize = 50;

/// Backends under test; the TempDir keeps the SQLite file alive
fn backends() -> (TempDir, Vec<Box<dyn TermBackend>>) {
    let dir = tempfile::tempdir().unwrap();
    let durable = SqliteBackend::open(&dir.path().join("terms.db")).unwrap();
    (dir, vec![Box::new(MemoryBackend::new()), Box::new(durable)])
}

fn for_each_backend(check: impl Fn(&dyn TermBackend)) {
    let (_dir, backends) = backends();
    for backend in &backends {
        check(backend.as_ref());
    }
}

fn terms(records: &[TermRecord]) -> Vec<&str> {
    records.iter().map(|r| r.term.as_str()).collect()
}

fn check_repeated_upsert(backend: &dyn TermBackend) {
    for now in 1..=7 {
        backend.upsert_increment("repeat", now * 100).unwrap();
    }
    let record = backend.get("repeat").unwrap().unwrap();
    assert_eq!(record.score, 7, "{}", backend.kind());
    assert_eq!(record.created_at, 100);
    assert_eq!(record.last_accessed, 700);
    assert!(record.created_at <= record.last_accessed);
}

fn check_stale_timestamp_keeps_access_time(backend: &dyn TermBackend) {
    backend.upsert_increment("t", 6).unwrap();
    backend.upsert_increment("t", 5).unwrap();

    let record = backend.get("t").unwrap().unwrap();
    assert_eq!(record.score, 2, "{}", backend.kind());
    assert_eq!(record.created_at, 6);
    assert_eq!(record.last_accessed, 6, "{}", backend.kind());
    assert!(record.created_at <= record.last_accessed);
}

fn check_ranking_order(backend: &dyn TermBackend) {
    backend.upsert_increment("low", 1).unwrap();
    backend.upsert_increment("tie-old", 2).unwrap();
    backend.upsert_increment("tie-new", 3).unwrap();
    backend.upsert_increment("tie-old", 4).unwrap();
    backend.upsert_increment("tie-new", 5).unwrap();
    backend.upsert_increment("top", 6).unwrap();
    backend.upsert_increment("top", 7).unwrap();
    backend.upsert_increment("top", 8).unwrap();

    let ranked = backend.ranked_top(10).unwrap();
    assert_eq!(terms(&ranked), vec!["top", "tie-new", "tie-old", "low"], "{}", backend.kind());
    for pair in ranked.windows(2) {
        assert!(
            (pair[0].score, pair[0].last_accessed) >= (pair[1].score, pair[1].last_accessed),
            "{}: {:?} before {:?}",
            backend.kind(),
            pair[0],
            pair[1]
        );
    }
}

fn check_limits(backend: &dyn TermBackend) {
    for (i, term) in ["a", "b", "c"].iter().enumerate() {
        backend.upsert_increment(term, i as i64).unwrap();
    }
    assert!(backend.ranked_top(0).unwrap().is_empty());
    assert_eq!(backend.ranked_top(2).unwrap().len(), 2);
    assert_eq!(backend.ranked_top(MAX_ENTRIES).unwrap().len(), 3);
}

fn check_capacity_eviction(backend: &dyn TermBackend) {
    for i in 0..60 {
        backend.upsert_increment(&format!("term-{i:02}"), 1_000 + i).unwrap();
        backend.enforce_capacity(MAX_ENTRIES).unwrap();
        assert!(backend.count().unwrap() <= MAX_ENTRIES);
    }
    assert_eq!(backend.count().unwrap(), MAX_ENTRIES, "{}", backend.kind());
    for i in 0..10 {
        assert!(backend.get(&format!("term-{i:02}")).unwrap().is_none(), "{}", backend.kind());
    }
    for i in 10..60 {
        assert!(backend.get(&format!("term-{i:02}")).unwrap().is_some());
    }
    assert_eq!(backend.enforce_capacity(MAX_ENTRIES).unwrap(), 0);
}

fn check_eviction_keeps_popular_terms(backend: &dyn TermBackend) {
    backend.upsert_increment("popular", 1).unwrap();
    backend.upsert_increment("popular", 2).unwrap();
    for i in 0..5 {
        backend.upsert_increment(&format!("fresh-{i}"), 10 + i).unwrap();
    }

    assert_eq!(backend.enforce_capacity(3).unwrap(), 3);
    assert_eq!(
        terms(&backend.ranked_top(10).unwrap()),
        vec!["popular", "fresh-4", "fresh-3"],
        "{}",
        backend.kind()
    );
}

fn check_deletes(backend: &dyn TermBackend) {
    backend.upsert_increment("a", 1).unwrap();
    backend.upsert_increment("b", 2).unwrap();
    backend.upsert_increment("c", 3).unwrap();

    assert_eq!(backend.delete_one("missing").unwrap(), 0);
    assert_eq!(backend.delete_one("A").unwrap(), 0);
    assert_eq!(backend.delete_one("a").unwrap(), 1);
    assert_eq!(backend.delete_one("a").unwrap(), 0);
    assert_eq!(backend.delete_all().unwrap(), 2);
    assert_eq!(backend.delete_all().unwrap(), 0);
    assert_eq!(backend.count().unwrap(), 0);
    assert!(backend.ranked_top(MAX_ENTRIES).unwrap().is_empty());
}

fn check_concurrent_increments(backend: &dyn TermBackend) {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 50;

    crossbeam::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move |_| {
                for i in 0..PER_THREAD {
                    backend.upsert_increment("contended", t * PER_THREAD + i).unwrap();
                }
            });
        }
    })
    .unwrap();

    let record = backend.get("contended").unwrap().unwrap();
    assert_eq!(record.score, (THREADS * PER_THREAD) as u64, "{}", backend.kind());
}

/// Fresh backends per check so state never leaks between them
macro_rules! parity_test {
    ($name:ident, $check:ident) => {
        #[test]
        fn $name() {
            for_each_backend($check);
        }
    };
}

parity_test!(test_repeated_upsert, check_repeated_upsert);
parity_test!(test_stale_timestamp_keeps_access_time, check_stale_timestamp_keeps_access_time);
parity_test!(test_ranking_order, check_ranking_order);
parity_test!(test_limits, check_limits);
parity_test!(test_capacity_eviction, check_capacity_eviction);
parity_test!(test_eviction_keeps_popular_terms, check_eviction_keeps_popular_terms);
parity_test!(test_deletes, check_deletes);
parity_test!(test_concurrent_increments, check_concurrent_increments);

#[test]
fn test_identical_sequences_give_identical_output() {
    let (_dir, backends) = backends();
    let script = [
        "movie-x", "movie-y", "movie-x", "日本語", "movie-z", "Movie-x", "movie-y", "movie-x", "a", "b",
    ];

    for backend in &backends {
        for (i, term) in script.iter().enumerate() {
            backend.upsert_increment(term, 5_000 + i as i64).unwrap();
            backend.enforce_capacity(6).unwrap();
        }
    }

    let outputs: Vec<String> = backends
        .iter()
        .map(|backend| serde_json::to_string(&backend.ranked_top(MAX_ENTRIES).unwrap()).unwrap())
        .collect();
    assert_eq!(backends[0].kind(), BackendKind::Transient);
    assert_eq!(backends[1].kind(), BackendKind::Durable);
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_exact_ties_break_identically() {
    let (_dir, backends) = backends();
    for backend in &backends {
        for term in ["zeta", "Alpha", "alpha", "beta"] {
            backend.upsert_increment(term, 42).unwrap();
        }
        backend.enforce_capacity(3).unwrap();
    }

    let memory = backends[0].ranked_top(MAX_ENTRIES).unwrap();
    let durable = backends[1].ranked_top(MAX_ENTRIES).unwrap();
    assert_eq!(memory, durable);
    assert_eq!(terms(&memory), vec!["Alpha", "alpha", "beta"]);
}
