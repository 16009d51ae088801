use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rankmap::SkipMap;

const N: usize = 10_000;

fn shuffled_keys() -> Vec<u64> {
  let mut rng = StdRng::seed_from_u64(7);
  let mut keys: Vec<u64> = (0..N as u64).collect();
  keys.shuffle(&mut rng);
  keys
}

fn bench_insert(c: &mut Criterion) {
  let keys = shuffled_keys();
  let mut group = c.benchmark_group("insert");
  group.bench_function("rankmap", |b| {
    b.iter(|| {
      let mut map = SkipMap::new();
      for &k in &keys {
        map.insert(k, k).unwrap();
      }
      black_box(map.len())
    })
  });
  group.bench_function("btreemap", |b| {
    b.iter(|| {
      let mut map = BTreeMap::new();
      for &k in &keys {
        map.insert(k, k);
      }
      black_box(map.len())
    })
  });
  group.finish();
}

fn bench_get(c: &mut Criterion) {
  let keys = shuffled_keys();
  let mut map = SkipMap::new();
  let mut btree = BTreeMap::new();
  for &k in &keys {
    map.insert(k, k).unwrap();
    btree.insert(k, k);
  }

  let mut group = c.benchmark_group("get");
  group.bench_function("rankmap", |b| {
    b.iter(|| {
      for &k in &keys {
        black_box(map.get(&k));
      }
    })
  });
  group.bench_function("btreemap", |b| {
    b.iter(|| {
      for &k in &keys {
        black_box(btree.get(&k));
      }
    })
  });
  group.finish();
}

fn bench_rank_access(c: &mut Criterion) {
  let keys = shuffled_keys();
  let mut map = SkipMap::new();
  for &k in &keys {
    map.insert(k, k).unwrap();
  }

  c.bench_function("key_at", |b| {
    b.iter(|| {
      for rank in 1..=N {
        black_box(map.key_at(rank));
      }
    })
  });
}

criterion_group!(benches, bench_insert, bench_get, bench_rank_access);
criterion_main!(benches);
