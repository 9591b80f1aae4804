use crate::PackedMemoryArray;

use crate::tests::validate_pma;
use proptest::prelude::*;
use proptest::sample::Index;
use proptest_derive::Arbitrary;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 6)]
    Insert(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 2)]
    Delete(Index),
    Find(#[proptest(strategy = "0u16..512")] u16),
    Predecessor(#[proptest(strategy = "0u16..512")] u16),
}

/// Slot of the `nth` live element.
fn nth_live_slot<T>(pma: &PackedMemoryArray<T>, nth: usize) -> Option<usize> {
    pma.slots()
        .enumerate()
        .filter(|(_, slot)| slot.is_some())
        .nth(nth)
        .map(|(i, _)| i)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_sorted_vec(first in 0u16..512, ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut pma = PackedMemoryArray::new(first);
        let mut model: Vec<u16> = vec![first];

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let capacity = pma.capacity();
                    let overflows = pma.len() + 1 > capacity / 2;
                    pma.insert(v);
                    let pos = model.partition_point(|&x| x <= v);
                    model.insert(pos, v);

                    let expected = if overflows { capacity * 2 } else { capacity };
                    prop_assert_eq!(pma.capacity(), expected);
                }
                Op::Delete(index) => {
                    if model.is_empty() {
                        continue;
                    }
                    let k = index.index(model.len());
                    let slot = nth_live_slot(&pma, k).unwrap();
                    let capacity = pma.capacity();
                    prop_assert_eq!(pma.delete_at(slot), model.remove(k));
                    prop_assert_eq!(pma.capacity(), capacity);
                }
                Op::Find(v) => {
                    let got = pma.find(&v).map(|slot| *pma.element_at(slot));
                    let expected = model.binary_search(&v).ok().map(|_| v);
                    prop_assert_eq!(got, expected);
                }
                Op::Predecessor(v) => {
                    let first = pma.predecessor_index(&v);
                    prop_assert_eq!(first, pma.predecessor_index(&v));

                    let got = first.map(|slot| *pma.element_at(slot));
                    let expected = model.partition_point(|&x| x <= v).checked_sub(1).map(|i| model[i]);
                    prop_assert_eq!(got, expected);
                }
            }

            prop_assert_eq!(pma.len(), model.len());
        }

        validate_pma(&pma);
        let got: Vec<u16> = pma.iter().copied().collect();
        prop_assert_eq!(got, model);
    }

    #[test]
    fn prop_every_insert_keeps_invariants(values in prop::collection::vec(any::<i32>(), 1..=300)) {
        let mut pma = PackedMemoryArray::new(values[0]);
        for &v in &values[1..] {
            pma.insert(v);
            validate_pma(&pma);
        }

        let mut sorted = values.clone();
        sorted.sort();
        let got: Vec<i32> = pma.iter().copied().collect();
        prop_assert_eq!(got, sorted);
    }

    #[test]
    fn prop_from_sorted_matches_input(mut values in prop::collection::vec(any::<i32>(), 1..=2000)) {
        values.sort();
        let pma = PackedMemoryArray::from_sorted(values.clone()).unwrap();
        validate_pma(&pma);

        let got: Vec<i32> = pma.iter().copied().collect();
        prop_assert_eq!(got, values.clone());

        let mut sequential = PackedMemoryArray::new(values[0]);
        for &v in &values[1..] {
            sequential.insert(v);
        }
        prop_assert_eq!(sequential.capacity(), pma.capacity());
    }
}
