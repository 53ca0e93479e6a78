//! RandomSource port - 乱数の抽象化
//!
//! random channel の抽選に使う。
//!
//! # 実装
//! - **ThreadRandom**: 本番用（thread_rng）
//! - **SeededRandom**: テスト用。seed と DrawScope から決定的に index を選ぶ
//!
//! SeededRandom は内部状態を持たない。同じ seed・同じ scope なら何回呼んでも同じ結果になるので、
//! `select_candidates` を 2 回呼んでも同じ候補が返る。

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{ChannelId, TenantId};

/// Identifies one draw: which channel is drawing, for which tenant, in which tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawScope {
    pub tenant_id: TenantId,
    pub channel_id: ChannelId,
    pub now: DateTime<Utc>,
}

pub trait RandomSource: Send + Sync {
    /// Pick an index uniformly in `0..len`. `len` is never zero.
    fn choose_index(&self, scope: &DrawScope, len: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn choose_index(&self, _scope: &DrawScope, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeededRandom {
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed for one draw: the seed folded with every scope field through splitmix64.
    fn draw_seed(&self, scope: &DrawScope) -> u64 {
        let tenant = scope.tenant_id.as_ulid().0;
        let channel = scope.channel_id.as_ulid().0;
        [
            (tenant >> 64) as u64,
            tenant as u64,
            (channel >> 64) as u64,
            channel as u64,
            scope.now.timestamp() as u64,
            u64::from(scope.now.timestamp_subsec_nanos()),
        ]
        .into_iter()
        .fold(splitmix64(self.seed), |acc, word| splitmix64(acc ^ word))
    }

    fn rng_for(&self, scope: &DrawScope) -> StdRng {
        StdRng::seed_from_u64(self.draw_seed(scope))
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl RandomSource for SeededRandom {
    fn choose_index(&self, scope: &DrawScope, len: usize) -> usize {
        self.rng_for(scope).gen_range(0..len)
    }
}
