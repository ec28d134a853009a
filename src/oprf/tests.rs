use super::msgs::{send_key, CorrectionMessage};
use super::*;
use crate::bit_matrix::bytes_for_bits;
use crate::channel_utils::byte_count::create_writecount_channels;
use crate::channel_utils::sync_channel::create_unix_channels;
use crate::correlation::{
    DealerCorrelation, Delta, OtCorrelationForReceiver, OtCorrelationForSender,
};
use crate::error::abort_reason;
use crate::prc::{PseudorandomCode, MAX_CAPACITY};
use ocelot::oprf::ObliviousPrf;
use ocelot::ot::{AlszReceiver, AlszSender};
use rand::{Rng, RngCore, SeedableRng};
use scuttlebutt::utils::{and_inplace, xor_inplace};
use scuttlebutt::{AesRng, Block};
use sha2::{Digest, Sha256};

struct Run {
    config: OprfConfig,
    max_future_evaluations: usize,
    dealer_seed: Block,
    rng_seed: Block,
    delta: Option<Delta>,
}

impl Run {
    fn new(config: OprfConfig) -> Self {
        let mut rng = AesRng::new();
        Self {
            config,
            max_future_evaluations: 0,
            dealer_seed: rng.gen(),
            rng_seed: rng.gen(),
            delta: None,
        }
    }

    fn exec<I: AsRef<[u8]> + Sync>(&self, inputs: &[I]) -> (ReceiverOutput, SenderOutput) {
        let (mut rch, mut sch) = create_unix_channels().unwrap();
        let n = inputs.len();
        let config = self.config;
        let max_future = self.max_future_evaluations;
        let dealer_seed = self.dealer_seed;
        let delta = self.delta.clone();

        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let provider = DealerCorrelation::new(dealer_seed);
            let sender = match delta {
                Some(delta) => Sender::setup_with_delta(
                    &mut sch, &mut rng, config, n, max_future, delta, provider,
                ),
                None => Sender::setup(&mut sch, &mut rng, config, n, max_future, provider),
            }
            .unwrap();
            sender.evaluate(&mut sch, n).unwrap()
        });

        let mut rng = AesRng::from_seed(self.rng_seed);
        let receiver = Receiver::setup(
            &mut rch,
            &mut rng,
            config,
            n,
            max_future,
            DealerCorrelation::new(dealer_seed),
        )
        .unwrap();
        let r = receiver.evaluate(&mut rch, inputs, &mut rng).unwrap();
        let s = handle.join().unwrap();

        (r, s)
    }
}

fn random_inputs(n: usize, rng: &mut AesRng) -> Vec<Vec<u8>> {
    (0..n)
        .map(|_| {
            let len = rng.gen_range(1..48);
            (0..len).map(|_| rng.gen::<u8>()).collect()
        })
        .collect()
}

fn check_recovery(config: OprfConfig, n: usize) {
    let mut rng = AesRng::new();
    let inputs = random_inputs(n, &mut rng);

    let (r, s) = Run::new(config).exec(&inputs);

    assert_eq!(r.batch_size(), n);
    assert_eq!(s.batch_size(), n);
    assert_eq!(r.output_len(), s.output_len());
    for (i, x) in inputs.iter().enumerate() {
        assert_eq!(r.input(i), Some(x.as_slice()));
        assert_eq!(s.evaluate(i, x).unwrap(), r.get(i).unwrap(), "position {}", i);
    }
}

#[test]
fn test_recovery_single() {
    check_recovery(OprfConfig::new(OprfVariant::Original), 1);
    check_recovery(OprfConfig::new(OprfVariant::Optimized), 1);
}

#[test]
fn test_recovery_two() {
    check_recovery(OprfConfig::new(OprfVariant::Original), 2);
    check_recovery(OprfConfig::new(OprfVariant::Optimized), 2);
}

#[test]
fn test_recovery_1000() {
    check_recovery(OprfConfig::new(OprfVariant::Original), 1000);
    check_recovery(OprfConfig::new(OprfVariant::Optimized), 1000);
}

#[test]
fn test_recovery_multithread() {
    check_recovery(OprfConfig::new(OprfVariant::Original).with_threads(4), 1000);
    check_recovery(OprfConfig::new(OprfVariant::Optimized).with_threads(3), 777);
}

#[test]
fn test_recovery_large() {
    check_recovery(OprfConfig::new(OprfVariant::Optimized).with_threads(4), 1 << 18);
}

#[test]
fn test_threads_do_not_change_outputs() {
    let mut rng = AesRng::new();
    let inputs = random_inputs(300, &mut rng);

    for variant in [OprfVariant::Original, OprfVariant::Optimized] {
        let mut run = Run::new(OprfConfig::new(variant));
        run.delta = Some(Delta::random(&mut rng, session_codeword_bits(300, 0).unwrap()));
        let (r1, s1) = run.exec(&inputs);

        run.config = run.config.with_threads(4);
        let (r4, s4) = run.exec(&inputs);

        assert_eq!(r1, r4);
        for i in 0..inputs.len() {
            assert_eq!(s1.row(i), s4.row(i));
        }
    }
}

#[test]
fn test_non_membership() {
    let mut rng = AesRng::new();
    let n = 200;
    let inputs = random_inputs(n, &mut rng);

    for variant in [OprfVariant::Original, OprfVariant::Optimized] {
        let (r, s) = Run::new(OprfConfig::new(variant)).exec(&inputs);

        let mut hits = 0;
        for i in 0..n {
            for _ in 0..5 {
                let mut y = inputs[i].clone();
                y.push(rng.gen());
                if s.evaluate(i, &y).unwrap() == r.get(i).unwrap() {
                    hits += 1;
                }
            }
            // Right value, wrong position.
            let j = (i + 1) % n;
            if inputs[j] != inputs[i] && s.evaluate(i, &inputs[j]).unwrap() == r.get(i).unwrap() {
                hits += 1;
            }
        }
        assert_eq!(hits, 0);
    }
}

// T rebuilt bit by bit: column j is the expansion of seeds[j], row i collects bit i of every column.
fn rows_from_column_seeds(seeds: &[Block], n: usize) -> Vec<Vec<u8>> {
    let mut rows = vec![vec![0u8; bytes_for_bits(seeds.len())]; n];
    for (j, seed) in seeds.iter().enumerate() {
        let mut column = vec![0u8; bytes_for_bits(n)];
        AesRng::from_seed(*seed).fill_bytes(&mut column);
        for (i, row) in rows.iter_mut().enumerate() {
            if (column[i / 8] >> (i % 8)) & 1 == 1 {
                row[j / 8] |= 1 << (j % 8);
            }
        }
    }
    rows
}

// SHA-256(counter || index || row) blocks, truncated to `len`.
fn output_of_row(i: usize, row: &[u8], len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut counter = 0u32;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_le_bytes());
        hasher.update((i as u64).to_le_bytes());
        hasher.update(row);
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(len);
    out
}

#[test]
fn test_abcd() {
    let inputs = ["a", "b", "c", "d"];
    let l = 408;
    let mut rng = AesRng::from_seed(Block::from(0x5eed_u128));

    // Seed pairs as dealt from seed 2.
    let mut dealer = AesRng::from_seed(Block::from(2u128));
    let pairs = (0..l)
        .map(|_| (dealer.gen::<Block>(), dealer.gen::<Block>()))
        .collect::<Vec<_>>();

    // Receiver rng seeded with 1: the code key first, then the original variant's column seeds.
    let mut receiver_rng = AesRng::from_seed(Block::from(1u128));
    let key: Block = receiver_rng.gen();
    let fresh = (0..l).map(|_| receiver_rng.gen::<Block>()).collect::<Vec<_>>();

    for variant in [OprfVariant::Original, OprfVariant::Optimized] {
        let mut run = Run::new(OprfConfig::new(variant));
        run.rng_seed = Block::from(1u128);
        run.dealer_seed = Block::from(2u128);
        run.delta = Some(Delta::random(&mut rng, session_codeword_bits(4, 0).unwrap()));

        let (r, s) = run.exec(&inputs);

        assert_eq!(s.code().codeword_bits(), l);
        assert_eq!(s.code().key(), key);
        assert_eq!(r.output_len(), 51);

        let t_seeds = match variant {
            OprfVariant::Original => fresh.clone(),
            OprfVariant::Optimized => pairs.iter().map(|(k0, _)| *k0).collect(),
        };
        let t = rows_from_column_seeds(&t_seeds, inputs.len());

        for (i, x) in inputs.iter().enumerate() {
            let expected = output_of_row(i, &t[i], 51);
            assert_eq!(r.get(i).unwrap(), expected.as_slice(), "position {}", i);
            assert_eq!(s.evaluate(i, x.as_bytes()).unwrap(), expected);

            let mut q = s.row(i).unwrap().to_vec();
            let mut c = PseudorandomCode::new(key, l).encode(x.as_bytes());
            and_inplace(&mut c, s.delta().as_bytes());
            xor_inplace(&mut q, &c);
            assert_eq!(q, t[i]);
        }
        assert_ne!(s.evaluate(0, b"b").unwrap(), r.get(0).unwrap());
        assert_ne!(s.evaluate(3, b"a").unwrap(), r.get(3).unwrap());
        assert_ne!(s.evaluate(1, b"e").unwrap(), r.get(1).unwrap());
    }
}

#[test]
fn test_oblivious_prf_types() {
    let inputs: Vec<<Receiver as ObliviousPrf>::Input> = vec![b"x".to_vec(), b"yz".to_vec()];
    let (r, s) = Run::new(OprfConfig::default()).exec(&inputs);

    let key: <Sender as ObliviousPrf>::Seed = s.code().key();
    assert_eq!(key, PseudorandomCode::new(key, 408).key());

    for (i, x) in inputs.iter().enumerate() {
        let out: <Sender as ObliviousPrf>::Output = s.evaluate(i, x).unwrap();
        let expected: <Receiver as ObliviousPrf>::Output = r.get(i).unwrap().to_vec();
        assert_eq!(out, expected);
    }
}

#[test]
fn test_variant_equivalence() {
    let mut rng = AesRng::new();
    let n = 64;
    let inputs = random_inputs(n, &mut rng);
    let mut candidates = random_inputs(n, &mut rng);
    for i in (0..n).step_by(3) {
        candidates[i] = inputs[i].clone();
    }

    let l = session_codeword_bits(n, 0).unwrap();
    let delta = Delta::random(&mut rng, l);

    let mut original = Run::new(OprfConfig::new(OprfVariant::Original));
    original.delta = Some(delta.clone());
    let mut optimized = Run::new(OprfConfig::new(OprfVariant::Optimized));
    optimized.delta = Some(delta.clone());
    optimized.rng_seed = original.rng_seed;
    optimized.dealer_seed = original.dealer_seed;

    let (r0, s0) = original.exec(&inputs);
    let (r1, s1) = optimized.exec(&inputs);

    assert_eq!(s0.code().key(), s1.code().key());
    assert_eq!(s0.delta(), s1.delta());

    for (i, (x, y)) in inputs.iter().zip(candidates.iter()).enumerate() {
        let m0 = s0.evaluate(i, y).unwrap() == r0.get(i).unwrap();
        let m1 = s1.evaluate(i, y).unwrap() == r1.get(i).unwrap();
        assert_eq!(m0, m1);
        assert_eq!(m0, x == y);
    }
}

#[test]
fn test_larger_future_capacity() {
    let mut rng = AesRng::new();
    let inputs = random_inputs(10, &mut rng);

    let mut run = Run::new(OprfConfig::default());
    run.max_future_evaluations = 1 << 20;
    let (r, s) = run.exec(&inputs);

    assert_eq!(s.code().codeword_bits(), 480);
    assert_eq!(r.output_len(), 60);
    for (i, x) in inputs.iter().enumerate() {
        assert_eq!(s.evaluate(i, x).unwrap(), r.get(i).unwrap());
    }
}

#[test]
fn test_truncated_correction() {
    let n = 16;
    let seed: Block = AesRng::new().gen();
    let l = session_codeword_bits(n, 0).unwrap();
    let (mut rch, mut sch) = create_unix_channels().unwrap();

    let handle = std::thread::spawn(move || {
        let mut rng = AesRng::new();
        let sender = Sender::setup(
            &mut sch,
            &mut rng,
            OprfConfig::default(),
            n,
            0,
            DealerCorrelation::new(seed),
        )
        .unwrap();
        sender.evaluate(&mut sch, n).unwrap_err()
    });

    let col_bytes = bytes_for_bits(n);
    send_key(&mut rch, Block::from(9u128)).unwrap();
    let correction =
        CorrectionMessage::from_entries(col_bytes, vec![vec![0u8; col_bytes]; l - 1]).unwrap();
    correction.write_to(&mut rch).unwrap();

    let err = handle.join().unwrap();
    assert_eq!(
        abort_reason(&err),
        Some(&OprfError::ParameterMismatch {
            what: "correction entries",
            expected: l,
            actual: l - 1,
        })
    );
}

#[test]
fn test_variant_disagreement_aborts() {
    let n = 8;
    let seed: Block = AesRng::new().gen();
    let (mut rch, mut sch) = create_unix_channels().unwrap();

    let handle = std::thread::spawn(move || {
        let mut rng = AesRng::new();
        let sender = Sender::setup(
            &mut sch,
            &mut rng,
            OprfConfig::new(OprfVariant::Optimized),
            n,
            0,
            DealerCorrelation::new(seed),
        )
        .unwrap();
        sender.evaluate(&mut sch, n).unwrap_err()
    });

    let mut rng = AesRng::new();
    let receiver = Receiver::setup(
        &mut rch,
        &mut rng,
        OprfConfig::new(OprfVariant::Original),
        n,
        0,
        DealerCorrelation::new(seed),
    )
    .unwrap();
    let inputs = random_inputs(n, &mut rng);
    receiver.evaluate(&mut rch, &inputs, &mut rng).unwrap();

    let err = handle.join().unwrap();
    assert!(matches!(
        abort_reason(&err),
        Some(OprfError::ParameterMismatch {
            what: "correction entries",
            ..
        })
    ));
}

#[test]
fn test_batch_size_errors() {
    let seed: Block = AesRng::new().gen();
    let (mut rch, mut sch) = create_unix_channels().unwrap();
    let mut rng = AesRng::new();

    let receiver = Receiver::setup(
        &mut rch,
        &mut rng,
        OprfConfig::default(),
        4,
        0,
        DealerCorrelation::new(seed),
    )
    .unwrap();
    let inputs = random_inputs(5, &mut rng);
    let err = receiver.evaluate(&mut rch, &inputs, &mut rng).unwrap_err();
    assert_eq!(
        abort_reason(&err),
        Some(&OprfError::BatchSizeExceeded {
            batch_size: 5,
            max_batch_size: 4,
        })
    );

    let receiver = Receiver::setup(
        &mut rch,
        &mut rng,
        OprfConfig::default(),
        4,
        0,
        DealerCorrelation::new(seed),
    )
    .unwrap();
    let err = receiver
        .evaluate::<_, _, Vec<u8>>(&mut rch, &[], &mut rng)
        .unwrap_err();
    assert_eq!(abort_reason(&err), Some(&OprfError::EmptyBatch));

    let sender = Sender::setup(
        &mut sch,
        &mut rng,
        OprfConfig::default(),
        4,
        0,
        DealerCorrelation::new(seed),
    )
    .unwrap();
    let err = sender.evaluate(&mut sch, 0).unwrap_err();
    assert_eq!(abort_reason(&err), Some(&OprfError::EmptyBatch));
}

#[test]
fn test_position_out_of_range() {
    let (_r, s) = Run::new(OprfConfig::default()).exec(&["x", "y"]);

    let err = s.evaluate(2, b"x").unwrap_err();
    assert_eq!(
        abort_reason(&err),
        Some(&OprfError::PositionOutOfRange {
            index: 2,
            batch_size: 2,
        })
    );
}

#[test]
fn test_setup_errors() {
    let seed: Block = AesRng::new().gen();
    let (mut rch, mut sch) = create_unix_channels().unwrap();
    let mut rng = AesRng::new();

    let err = Receiver::setup(
        &mut rch,
        &mut rng,
        OprfConfig::default(),
        4,
        MAX_CAPACITY + 1,
        DealerCorrelation::new(seed),
    )
    .err()
    .unwrap();
    assert!(matches!(
        abort_reason(&err),
        Some(OprfError::CapacityExceeded { .. })
    ));

    let err = Sender::setup_with_delta(
        &mut sch,
        &mut rng,
        OprfConfig::default(),
        4,
        0,
        Delta::random(&mut rng, 100),
        DealerCorrelation::new(seed),
    )
    .err()
    .unwrap();
    assert_eq!(
        abort_reason(&err),
        Some(&OprfError::ParameterMismatch {
            what: "delta bits",
            expected: 408,
            actual: 100,
        })
    );
}

#[test]
fn test_optimized_halves_correction_traffic() {
    let n = 500;
    let mut rng = AesRng::new();
    let inputs = random_inputs(n, &mut rng);
    let l = session_codeword_bits(n, 0).unwrap();
    let col_bytes = bytes_for_bits(n);

    let sent = [OprfVariant::Original, OprfVariant::Optimized].map(|variant| {
        let config = OprfConfig::new(variant);
        let seed: Block = rng.gen();
        let ((mut rch, receiver_sent), (mut sch, sender_sent)) =
            create_writecount_channels().unwrap();

        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let sender =
                Sender::setup(&mut sch, &mut rng, config, n, 0, DealerCorrelation::new(seed))
                    .unwrap();
            sender.evaluate(&mut sch, n).unwrap();
        });

        let receiver =
            Receiver::setup(&mut rch, &mut rng, config, n, 0, DealerCorrelation::new(seed))
                .unwrap();
        receiver.evaluate(&mut rch, &inputs, &mut rng).unwrap();
        handle.join().unwrap();

        assert_eq!(sender_sent.total_bytes(), 0);
        receiver_sent.total_bytes()
    });

    // KEY block plus the two CORRECTION header words.
    let overhead = 16 + 2 * std::mem::size_of::<usize>();
    assert_eq!(sent[0], overhead + 2 * l * col_bytes);
    assert_eq!(sent[1], overhead + l * col_bytes);
    assert_eq!(sent[0] - overhead, 2 * (sent[1] - overhead));
}

#[test]
fn test_ot_correlation_end_to_end() {
    let n = 100;
    let mut rng = AesRng::new();
    let inputs = random_inputs(n, &mut rng);

    for variant in [OprfVariant::Original, OprfVariant::Optimized] {
        let config = OprfConfig::new(variant);
        let (mut rch, mut sch) = create_unix_channels().unwrap();

        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let sender = Sender::setup(
                &mut sch,
                &mut rng,
                config,
                n,
                0,
                OtCorrelationForSender::<AlszReceiver>::new(),
            )
            .unwrap();
            sender.evaluate(&mut sch, n).unwrap()
        });

        let receiver = Receiver::setup(
            &mut rch,
            &mut rng,
            config,
            n,
            0,
            OtCorrelationForReceiver::<AlszSender>::new(),
        )
        .unwrap();
        let r = receiver.evaluate(&mut rch, &inputs, &mut rng).unwrap();
        let s = handle.join().unwrap();

        for (i, x) in inputs.iter().enumerate() {
            assert_eq!(s.evaluate(i, x).unwrap(), r.get(i).unwrap());
            assert_ne!(s.evaluate(i, b"").unwrap(), r.get(i).unwrap());
        }
    }
}
