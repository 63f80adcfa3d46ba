use std::env::current_dir;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use std::{fs, process};

use rand::Rng;
use rockbridge::{ConcurrencyMode, Session, TransactionOptions};
use tempfile::TempDir;

const ELEMENTS: usize = 100_000;
const BATCH_SIZE: usize = 1000;
const WRITERS: usize = 8;
const WRITES_PER_WRITER: usize = 5_000;
const CONTENDED_INCREMENTS: usize = 2_000;
const KEY_SIZE: usize = 24;
const VALUE_SIZE: usize = 150;

fn random_pairs(count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let key: Vec<u8> = (0..KEY_SIZE).map(|_| rng.random()).collect();
            let value: Vec<u8> = (0..VALUE_SIZE).map(|_| rng.random()).collect();
            (key, value)
        })
        .collect()
}

fn open(dir: &Path, mode: ConcurrencyMode) -> Session {
    Session::builder()
        .mode(mode)
        .increase_parallelism(thread::available_parallelism().map_or(1, |n| n.get()) as i32)
        .open(dir)
        .unwrap()
}

fn bulk_commit(session: &Session, pairs: &[(Vec<u8>, Vec<u8>)]) -> Duration {
    let cf = session.create_column_family("bulk").unwrap();
    let start = Instant::now();
    for chunk in pairs.chunks(BATCH_SIZE) {
        let mut txn = session.transaction();
        for (key, value) in chunk {
            txn.put(&cf, key, value).unwrap();
        }
        txn.commit().unwrap();
    }
    start.elapsed()
}

fn single_put_commit(session: &Session, pairs: &[(Vec<u8>, Vec<u8>)]) -> Duration {
    let cf = session.create_column_family("single").unwrap();
    let start = Instant::now();
    for (key, value) in pairs.iter().take(ELEMENTS / 10) {
        let mut txn = session.transaction();
        txn.put(&cf, key, value).unwrap();
        txn.commit().unwrap();
    }
    start.elapsed()
}

fn random_reads(session: &Session, pairs: &[(Vec<u8>, Vec<u8>)]) -> Duration {
    let cf = session.column_family("bulk").unwrap();
    let mut rng = rand::rng();
    let start = Instant::now();
    let txn = session.transaction();
    for _ in 0..ELEMENTS {
        let (key, value) = &pairs[rng.random_range(0..pairs.len())];
        assert_eq!(txn.get(&cf, key).unwrap().as_ref(), Some(value));
    }
    start.elapsed()
}

fn full_scan(session: &Session) -> Duration {
    let cf = session.column_family("bulk").unwrap();
    let start = Instant::now();
    let mut cursor = session.raw().iterator(&cf).unwrap();
    let mut count = 0;
    cursor.seek_to_first();
    while cursor.is_valid() {
        count += 1;
        cursor.next();
    }
    cursor.status().unwrap();
    assert_eq!(count, ELEMENTS);
    start.elapsed()
}

/// Each writer owns its own column family, so there is no contention.
fn disjoint_writers(session: &Session) -> Duration {
    let families: Vec<_> = (0..WRITERS)
        .map(|i| session.create_column_family(&format!("writer_{i}")).unwrap())
        .collect();

    let start = Instant::now();
    thread::scope(|s| {
        for cf in &families {
            s.spawn(move || {
                for i in 0..WRITES_PER_WRITER {
                    let mut txn = session.transaction();
                    txn.put(cf, &(i as u64).to_be_bytes(), &[0u8; VALUE_SIZE])
                        .unwrap();
                    txn.commit().unwrap();
                }
            });
        }
    });
    start.elapsed()
}

/// Every writer increments one shared counter. Pessimistic writers queue on
/// the row lock; optimistic writers retry on conflict.
fn contended_counter(session: &Session) -> (Duration, usize) {
    let cf = session.create_column_family("counter").unwrap();
    session.raw().put(&cf, b"counter", &0u64.to_be_bytes()).unwrap();

    let start = Instant::now();
    let retries: usize = thread::scope(|s| {
        let workers: Vec<_> = (0..WRITERS)
            .map(|_| {
                let cf = &cf;
                s.spawn(move || {
                    let options = TransactionOptions::for_mode(session.mode())
                        .lock_timeout(Duration::from_secs(10));
                    let mut retries = 0;
                    let mut txn = session.begin_transaction(options).unwrap();
                    for _ in 0..CONTENDED_INCREMENTS / WRITERS {
                        loop {
                            let current = txn.get_for_update(cf, b"counter").unwrap().unwrap();
                            let next = u64::from_be_bytes(current.try_into().unwrap()) + 1;
                            txn.put(cf, b"counter", &next.to_be_bytes()).unwrap();
                            let committed = txn.commit();
                            txn.renew().unwrap();
                            match committed {
                                Ok(()) => break,
                                Err(err) if err.is_conflict() => retries += 1,
                                Err(err) => panic!("increment failed: {err}"),
                            }
                        }
                    }
                    retries
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });
    let elapsed = start.elapsed();

    let total = session.raw().get(&cf, b"counter").unwrap().unwrap();
    assert_eq!(
        u64::from_be_bytes(total.try_into().unwrap()),
        (CONTENDED_INCREMENTS / WRITERS * WRITERS) as u64
    );
    (elapsed, retries)
}

fn benchmark(
    dir: &Path,
    mode: ConcurrencyMode,
    pairs: &[(Vec<u8>, Vec<u8>)],
) -> Vec<(String, String)> {
    let session = open(dir, mode);
    let mut results = Vec::new();

    let duration = bulk_commit(&session, pairs);
    println!("{mode:?}: bulk load {} items in {}ms", ELEMENTS, duration.as_millis());
    results.push(("bulk load".to_string(), format!("{}ms", duration.as_millis())));

    let duration = single_put_commit(&session, pairs);
    results.push((
        "individual commits".to_string(),
        format!("{}ms", duration.as_millis()),
    ));

    let duration = random_reads(&session, pairs);
    results.push(("random reads".to_string(), format!("{}ms", duration.as_millis())));

    let duration = full_scan(&session);
    results.push(("full scan".to_string(), format!("{}ms", duration.as_millis())));

    let duration = disjoint_writers(&session);
    let ops = (WRITERS * WRITES_PER_WRITER) as f64 / duration.as_secs_f64();
    results.push((
        format!("{WRITERS} disjoint writers"),
        format!("{}K ops/sec", ops as u64 / 1000),
    ));

    let (duration, retries) = contended_counter(&session);
    results.push((
        format!("{WRITERS} contended writers"),
        format!("{}ms ({retries} retries)", duration.as_millis()),
    ));

    results
}

fn main() {
    let _ = env_logger::try_init();
    let tmpdir = current_dir().unwrap().join(".benchmark_modes");
    let _ = fs::remove_dir_all(&tmpdir);
    fs::create_dir(&tmpdir).unwrap();

    let tmpdir2 = tmpdir.clone();
    ctrlc::set_handler(move || {
        let _ = fs::remove_dir_all(&tmpdir2);
        process::exit(1);
    })
    .unwrap();

    let pairs = random_pairs(ELEMENTS);

    let pessimistic_results = {
        let dir: TempDir = tempfile::tempdir_in(&tmpdir).unwrap();
        benchmark(dir.path(), ConcurrencyMode::Pessimistic, &pairs)
    };

    let optimistic_results = {
        let dir: TempDir = tempfile::tempdir_in(&tmpdir).unwrap();
        benchmark(dir.path(), ConcurrencyMode::Optimistic, &pairs)
    };

    fs::remove_dir_all(&tmpdir).unwrap();

    let mut table = comfy_table::Table::new();
    table.load_preset(comfy_table::presets::ASCII_MARKDOWN);
    table.set_width(100);
    table.set_header(["", "pessimistic", "optimistic"]);
    for ((name, pessimistic), (_, optimistic)) in
        pessimistic_results.into_iter().zip(optimistic_results)
    {
        table.add_row([name, pessimistic, optimistic]);
    }

    println!();
    println!("{table}");
}
