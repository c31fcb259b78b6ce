use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use ieee802154_security::{
    ccm::{self, Ccm, Cipher, SoftwareCipher},
    security::{AddrMode, Config, KeyIdMode, SecurityContext, SecurityLevel},
};

const PAN_ID: u16 = 0x0023;
const KEY: [u8; 16] = *b"pizza_margherita";
const ADDRESS_A: [u8; 8] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];
const ADDRESS_B: [u8; 8] = [0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
const HEADER_A_TO_B: [u8; 15] = [
    0x49, 0xC8, 0x2A, 0x23, 0x00, 0x02, 0x00, 0x77, 0x66, 0x55, 0x44, 0x33,
    0x22, 0x11, 0x00,
];
const PAYLOAD: [u8; 100] = [0x5A; 100];

// CCM* -----------------------------------------------------------------------

fn ccm_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("ccm");
    let mut cipher = Cipher::new(SoftwareCipher);
    cipher.set_key(&KEY);
    let nonce = ccm::nonce(&ADDRESS_A, 1, 6);

    group.bench_function("ecb_block", |b| {
        let mut out = [0; 16];
        b.iter(|| cipher.ecb(&mut out, &[0x42; 16]))
    });

    group.bench_function("compute_mic", |b| {
        b.iter(|| {
            Ccm::new(&mut cipher, nonce)
                .compute_mic(8, &HEADER_A_TO_B, &PAYLOAD)
                .unwrap()
        })
    });

    group.bench_function("crypt_payload", |b| {
        let mut payload = PAYLOAD;
        b.iter(|| Ccm::new(&mut cipher, nonce).crypt_payload(&mut payload))
    });

    group.finish();
}

// Security context -----------------------------------------------------------

fn context(
    config: Config,
    short: u16,
    long: &[u8; 8],
    mode: AddrMode,
) -> SecurityContext<SoftwareCipher> {
    let ctx = SecurityContext::new(SoftwareCipher);
    ctx.set_config(config);
    let key = ctx.add_key(&KEY).unwrap();
    let dev = ctx.add_dev(PAN_ID, short, long).unwrap();
    let rule = ctx.add_key_lookup_implicit(key, dev, mode).unwrap();
    ctx.peer_dev(rule, dev).unwrap();

    ctx
}

fn security(c: &mut Criterion) {
    // Check for no_replay enabled, because otherwise the repeated
    // unsecuring of the same frame fails
    if cfg!(not(feature = "no_replay")) {
        panic!("Run with --features no_replay");
    }

    let mut group = c.benchmark_group("security");
    let config = Config {
        security_level: SecurityLevel::EncMic64,
        key_id_mode: KeyIdMode::Implicit,
        ..Config::default()
    };
    let a = context(config, 0x0002, &ADDRESS_B, AddrMode::Short);
    let b = context(config, 0x0001, &ADDRESS_A, AddrMode::Long);

    let mut header = [0; 32];
    header[..15].copy_from_slice(&HEADER_A_TO_B);
    group.bench_function("encrypt", |bench| {
        bench.iter_batched(
            || PAYLOAD,
            |mut payload| {
                let mut mic = [0; 16];
                a.encrypt(&mut header, 15, &mut payload, &mut mic, &ADDRESS_A)
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });

    let mut payload = PAYLOAD;
    let mut mic = [0; 16];
    let secured = a
        .encrypt(&mut header, 15, &mut payload, &mut mic, &ADDRESS_A)
        .unwrap();
    let mut frame = header[..secured.header_len].to_vec();
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&mic[..secured.mic_len]);
    group.bench_function("decrypt", |bench| {
        bench.iter_batched(
            || frame.clone(),
            |mut frame| b.decrypt(&mut frame, 15).unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(ccm_benches, ccm_engine);
criterion_group!(security_benches, security);
criterion_main!(ccm_benches, security_benches);
