//! 开奖用的 Fisher–Yates 洗牌

use rand::Rng;

/// 原地洗牌：从最后一个下标向下到 1，每一步与 `[0, i]` 内均匀选取的下标交换
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// 洗牌后取前 `count` 个；`count` 超过总数时全部返回
pub fn pick_winners<T, R: Rng + ?Sized>(mut items: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    fisher_yates(&mut items, rng);
    items.truncate(count.min(items.len()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [0usize, 1, 2, 5, 33] {
            let original: Vec<usize> = (0..len).collect();
            let mut shuffled = original.clone();
            fisher_yates(&mut shuffled, &mut rng);
            let mut sorted = shuffled.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, original);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        fisher_yates(&mut a, &mut StdRng::seed_from_u64(99));
        fisher_yates(&mut b, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pick_winners_bounded_by_entries() {
        let mut rng = StdRng::seed_from_u64(1);
        let winners = pick_winners(vec![1, 2, 3, 4], 10, &mut rng);
        assert_eq!(winners.len(), 4);

        let winners = pick_winners(vec![1, 2, 3, 4], 2, &mut rng);
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0], winners[1]);

        let winners: Vec<i32> = pick_winners(Vec::new(), 3, &mut rng);
        assert!(winners.is_empty());
    }

    #[test]
    fn test_each_entry_equally_likely_to_win() {
        // 5 人中抽 2 人，每人中奖概率应为 0.4
        let trials = 50_000;
        let mut rng = StdRng::seed_from_u64(2024);
        let mut hits = [0u32; 5];
        for _ in 0..trials {
            for w in pick_winners((0..5).collect::<Vec<usize>>(), 2, &mut rng) {
                hits[w] += 1;
            }
        }
        let expected = trials as f64 * 0.4;
        for (idx, h) in hits.iter().enumerate() {
            let deviation = (*h as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.03,
                "entry {idx} won {h} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn test_every_position_uniform() {
        // 任一元素落在每个位置的频率都应接近 1/n
        let trials = 40_000;
        let n = 4;
        let mut rng = StdRng::seed_from_u64(5);
        let mut counts = vec![[0u32; 4]; n];
        for _ in 0..trials {
            let mut items: Vec<usize> = (0..n).collect();
            fisher_yates(&mut items, &mut rng);
            for (pos, item) in items.iter().enumerate() {
                counts[*item][pos] += 1;
            }
        }
        let expected = trials as f64 / n as f64;
        for row in &counts {
            for c in row {
                assert!((*c as f64 - expected).abs() / expected < 0.05);
            }
        }
    }
}
