//! Height-keyed retarget rule table.
//!
//! Rules are matched first-to-last; the first entry whose height range
//! contains the height decides how the required target is computed.

use crate::compact::{bits_to_target, target_to_bits};
use crate::errors::DifficultyError;
use crate::kgw::gravity_well;
use crate::legacy::legacy_retarget;
use crate::source::HeaderSource;
use consensus_core::constants::{CHUNK_SIZE, GENESIS_BITS, SIMNET_POW_BITS};
use consensus_core::{BlockHeight, NetworkType, Params};
use primitive_types::U256;
use std::ops::RangeInclusive;
use tracing::trace;

/// Below this height the classic 2016-header retarget applies
pub const LEGACY_RETARGET_END: BlockHeight = 26_754;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetRule {
    /// Difficulty is not enforced; yields `(0, 0)`
    Unenforced,
    /// Hardcoded bits
    Fixed(u32),
    /// Target of the checkpoint covering the height's chunk
    Checkpoint,
    /// Every-2016-headers retarget
    Legacy,
    /// Kimoto Gravity Well
    GravityWell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub heights: RangeInclusive<BlockHeight>,
    pub rule: RetargetRule,
}

fn entry(heights: RangeInclusive<BlockHeight>, rule: RetargetRule) -> RuleEntry {
    RuleEntry { heights, rule }
}

#[derive(Debug, Clone)]
pub struct DifficultySchedule {
    entries: Vec<RuleEntry>,
    checkpoint_targets: Vec<U256>,
}

impl DifficultySchedule {
    pub fn for_params(params: &Params) -> Self {
        let checkpoint_targets: Vec<U256> = params.checkpoints.iter().map(|cp| cp.target).collect();
        let all = BlockHeight::MIN..=BlockHeight::MAX;

        let entries = match params.net {
            _ if params.skip_pow_checks => vec![entry(all, RetargetRule::Unenforced)],
            NetworkType::Testnet => vec![entry(all, RetargetRule::Unenforced)],
            NetworkType::Simnet => vec![entry(all, RetargetRule::Fixed(SIMNET_POW_BITS))],
            NetworkType::Mainnet => {
                let checkpointed_end = checkpoint_targets.len() as BlockHeight * CHUNK_SIZE;
                let mut entries = vec![
                    entry(BlockHeight::MIN..=0, RetargetRule::Fixed(GENESIS_BITS)),
                    entry(208_301..=208_301, RetargetRule::Fixed(GENESIS_BITS)),
                    entry(468_741..=468_741, RetargetRule::Fixed(0x1c00_e50b)),
                    entry(1_080_000..=1_080_009, RetargetRule::Fixed(0x1b0f_fff0)),
                    entry(1_500_000..=1_500_009, RetargetRule::Fixed(0x1c07_fff8)),
                ];
                if checkpointed_end > 0 {
                    entries.push(entry(0..=checkpointed_end - 1, RetargetRule::Checkpoint));
                }
                entries.push(entry(BlockHeight::MIN..=LEGACY_RETARGET_END - 1, RetargetRule::Legacy));
                entries.push(entry(all, RetargetRule::GravityWell));
                entries
            }
        };

        Self { entries, checkpoint_targets }
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn rule_for(&self, height: BlockHeight) -> RetargetRule {
        self.entries
            .iter()
            .find(|e| e.heights.contains(&height))
            .map(|e| e.rule)
            .unwrap_or(RetargetRule::GravityWell)
    }

    /// Required `(bits, target)` for the header at `height`.
    pub fn required_target<S: HeaderSource>(&self, height: BlockHeight, source: &mut S) -> Result<(u32, U256), S::Error> {
        let rule = self.rule_for(height);
        trace!("required target at {} by {:?}", height, rule);
        match rule {
            RetargetRule::Unenforced => Ok((0, U256::zero())),
            RetargetRule::Fixed(bits) => Ok((bits, bits_to_target(bits).map_err(DifficultyError::from)?)),
            RetargetRule::Checkpoint => {
                let target = usize::try_from(height / CHUNK_SIZE)
                    .ok()
                    .and_then(|i| self.checkpoint_targets.get(i))
                    .copied()
                    .ok_or(DifficultyError::MissingCheckpoint(height))?;
                Ok((target_to_bits(target), target))
            }
            RetargetRule::Legacy => legacy_retarget(height, source),
            RetargetRule::GravityWell => gravity_well(height, source),
        }
    }
}

/// Whether bits and PoW of the header at `height` are checked against the
/// computed requirement.
///
/// Checkpointed chunks are trusted. With checkpoints present, the two chunks
/// right after them are not checked either, as the retarget history they need
/// lies in the sparse checkpointed region.
pub fn should_check_bits_target(params: &Params, height: BlockHeight) -> bool {
    let index = height.div_euclid(CHUNK_SIZE);
    let checkpointed = params.checkpoints.len() as BlockHeight;
    if index < checkpointed {
        return false;
    }
    checkpointed == 0 || index > checkpointed + 1
}
