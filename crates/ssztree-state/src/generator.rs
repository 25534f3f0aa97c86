// crates/ssztree-state/src/generator.rs

//! Seeded synthetic state generator used by the CLI `generate` subcommand,
//! the benches, and the migration tests. Deterministic for a given seed.

#![allow(clippy::cast_possible_truncation)]

use rand::{rngs::StdRng, Rng as _, SeedableRng};

use ssztree_schema::{BasicList, Bitvector, ByteVector, CompositeVector};

use crate::any_fork::{AnyState, ForkName};
use crate::containers::{
    BeaconBlockHeader, BeaconStateAltair, BeaconStatePhase0, Checkpoint, Fork, Validator,
    EPOCHS_PER_HISTORICAL_VECTOR, SLOTS_PER_HISTORICAL_ROOT,
};

fn root32(rng: &mut StdRng) -> ByteVector<32> {
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes[..]);
    ByteVector::from_bytes(&bytes).unwrap_or_default()
}

fn validator(rng: &mut StdRng, index: u64) -> Validator {
    let mut pubkey = [0u8; 48];
    rng.fill(&mut pubkey[..]);
    let mut credentials = [0u8; 32];
    rng.fill(&mut credentials[..]);
    credentials[0] = 0x01;
    Validator {
        pubkey: ByteVector::from_bytes(&pubkey).unwrap_or_default(),
        withdrawal_credentials: ByteVector::from_bytes(&credentials).unwrap_or_default(),
        effective_balance: 32_000_000_000,
        slashed: rng.random_bool(0.01),
        activation_eligibility_epoch: index / 4,
        activation_epoch: index / 4 + 1,
        exit_epoch: u64::MAX,
        withdrawable_epoch: u64::MAX,
    }
}

fn phase0_core(rng: &mut StdRng, n_validators: usize) -> BeaconStatePhase0 {
    let mut validators = Vec::with_capacity(n_validators);
    let mut balances = Vec::with_capacity(n_validators);
    for i in 0..n_validators {
        validators.push(validator(rng, i as u64));
        balances.push(31_000_000_000 + rng.random_range(0..2_000_000_000u64));
    }

    let roots = |rng: &mut StdRng, n: usize| -> Vec<ByteVector<32>> {
        (0..n).map(|_| root32(rng)).collect()
    };

    BeaconStatePhase0 {
        genesis_time: 1_606_824_023,
        genesis_validators_root: root32(rng),
        slot: rng.random_range(1..1_000_000),
        fork: Fork {
            previous_version: ByteVector::from_bytes(&[0, 0, 0, 0]).unwrap_or_default(),
            current_version: ByteVector::from_bytes(&[1, 0, 0, 0]).unwrap_or_default(),
            epoch: 0,
        },
        latest_block_header: BeaconBlockHeader {
            slot: 1,
            proposer_index: rng.random_range(0..n_validators.max(1) as u64),
            parent_root: root32(rng),
            state_root: root32(rng),
            body_root: root32(rng),
        },
        block_roots: CompositeVector::from_elements(roots(rng, SLOTS_PER_HISTORICAL_ROOT))
            .unwrap_or_default(),
        state_roots: CompositeVector::from_elements(roots(rng, SLOTS_PER_HISTORICAL_ROOT))
            .unwrap_or_default(),
        eth1_deposit_index: n_validators as u64,
        validators: crate::containers::ValidatorRegistry::from_elements(validators)
            .unwrap_or_default(),
        balances: BasicList::from_elements(balances).unwrap_or_default(),
        randao_mixes: CompositeVector::from_elements(roots(rng, EPOCHS_PER_HISTORICAL_VECTOR))
            .unwrap_or_default(),
        slashings: ssztree_schema::BasicVector::default(),
        justification_bits: Bitvector::from_bools(&[true, true, false, false])
            .unwrap_or_default(),
        previous_justified_checkpoint: Checkpoint { epoch: 8, root: root32(rng) },
        current_justified_checkpoint: Checkpoint { epoch: 9, root: root32(rng) },
        finalized_checkpoint: Checkpoint { epoch: 8, root: root32(rng) },
    }
}

/// Generate a deterministic synthetic state with `n_validators` entries.
#[must_use]
pub fn generate_state(fork: ForkName, n_validators: usize, seed: u64) -> AnyState {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = phase0_core(&mut rng, n_validators);
    match fork {
        ForkName::Phase0 => AnyState::Phase0(base),
        ForkName::Altair => {
            let participation: Vec<u8> =
                (0..n_validators).map(|_| rng.random_range(0..8)).collect();
            let scores: Vec<u64> = (0..n_validators).map(|_| rng.random_range(0..4)).collect();
            AnyState::Altair(BeaconStateAltair {
                genesis_time: base.genesis_time,
                genesis_validators_root: base.genesis_validators_root,
                slot: base.slot,
                fork: base.fork,
                latest_block_header: base.latest_block_header,
                block_roots: base.block_roots,
                state_roots: base.state_roots,
                eth1_deposit_index: base.eth1_deposit_index,
                validators: base.validators,
                balances: base.balances,
                randao_mixes: base.randao_mixes,
                slashings: base.slashings,
                justification_bits: base.justification_bits,
                previous_justified_checkpoint: base.previous_justified_checkpoint,
                current_justified_checkpoint: base.current_justified_checkpoint,
                finalized_checkpoint: base.finalized_checkpoint,
                previous_epoch_participation: BasicList::from_elements(participation.clone())
                    .unwrap_or_default(),
                current_epoch_participation: BasicList::from_elements(participation)
                    .unwrap_or_default(),
                inactivity_scores: BasicList::from_elements(scores).unwrap_or_default(),
            })
        }
    }
}
