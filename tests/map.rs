use proptest::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rankmap::SkipMap;

#[derive(Debug, Clone)]
enum Op {
  Insert(u8, u16),
  Remove(u8),
  UpdateAt(usize, u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
    any::<u8>().prop_map(Op::Remove),
    (0usize..64, any::<u16>()).prop_map(|(r, v)| Op::UpdateAt(r, v)),
  ]
}

/// Reference model: a sorted vector with the map's duplicate semantics,
/// where a new entry with an equal key goes in front of the existing ones.
#[derive(Default)]
struct Model {
  entries: Vec<(u8, u16)>,
}

impl Model {
  fn insert(&mut self, k: u8, v: u16) {
    let at = self.entries.partition_point(|(ek, _)| *ek < k);
    self.entries.insert(at, (k, v));
  }

  fn remove(&mut self, k: u8) -> usize {
    let before = self.entries.len();
    self.entries.retain(|(ek, _)| *ek != k);
    before - self.entries.len()
  }

  fn update_at(&mut self, rank: usize, v: u16) -> Option<u16> {
    if rank == 0 || rank > self.entries.len() {
      return None;
    }
    Some(std::mem::replace(&mut self.entries[rank - 1].1, v))
  }
}

proptest! {
  #[test]
  fn behaves_like_a_sorted_model(ops in proptest::collection::vec(op_strategy(), 1..256)) {
    let mut map = SkipMap::new();
    let mut model = Model::default();

    for op in ops {
      match op {
        Op::Insert(k, v) => {
          map.insert(k, v).unwrap();
          model.insert(k, v);
        }
        Op::Remove(k) => {
          prop_assert_eq!(map.remove(&k), model.remove(k));
        }
        Op::UpdateAt(rank, v) => {
          prop_assert_eq!(map.update_at(rank, v), model.update_at(rank, v));
        }
      }
      prop_assert_eq!(map.len(), model.entries.len());
    }

    let collected: Vec<(u8, u16)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(&collected, &model.entries);

    for (i, (k, v)) in model.entries.iter().enumerate() {
      prop_assert_eq!(map.key_at(i + 1), Some(k));
      prop_assert_eq!(map.value_at(i + 1), Some(v));
    }
    prop_assert_eq!(map.key_at(0), None);
    prop_assert_eq!(map.key_at(model.entries.len() + 1), None);
  }

  #[test]
  fn search_agrees_with_the_model(
    keys in proptest::collection::vec(any::<u8>(), 0..128),
    probes in proptest::collection::vec(any::<u8>(), 0..32),
  ) {
    let mut map = SkipMap::new();
    let mut model = Model::default();
    for (i, &k) in keys.iter().enumerate() {
      map.insert(k, i as u16).unwrap();
      model.insert(k, i as u16);
    }

    for probe in probes {
      let expected = model
        .entries
        .iter()
        .find(|(k, _)| *k == probe)
        .map(|(_, v)| v);
      prop_assert_eq!(map.get(&probe), expected);
    }
  }
}

#[test]
fn shuffled_insert_remove_stress() {
  let mut rng = StdRng::seed_from_u64(0xA11CE);
  let mut keys: Vec<u32> = (0..2000).collect();
  keys.shuffle(&mut rng);

  let mut map = SkipMap::new();
  for &k in &keys {
    map.insert(k, u64::from(k) * 3).unwrap();
  }
  assert_eq!(map.len(), 2000);
  for rank in 1..=2000usize {
    assert_eq!(map.key_at(rank), Some(&(rank as u32 - 1)));
  }

  keys.shuffle(&mut rng);
  for &k in keys.iter().take(1000) {
    assert_eq!(map.remove(&k), 1);
  }
  assert_eq!(map.len(), 1000);

  let mut remaining: Vec<u32> = keys[1000..].to_vec();
  remaining.sort_unstable();
  for (i, k) in remaining.iter().enumerate() {
    assert_eq!(map.key_at(i + 1), Some(k));
    assert_eq!(map.value_at(i + 1), Some(&(u64::from(*k) * 3)));
  }
}
