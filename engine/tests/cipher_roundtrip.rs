use panther::crypto::block::Transformation;
use panther::crypto::kdf;
use panther::engine::{self, ChannelSink, CipherEngine, EngineState, Mode};
use panther::{ErrorKind, Key, PantherError, Password};

#[test]
fn quick_encryption_roundtrip_for_every_transformation() {
    // 每种受支持的变换名称都能用同一口令加密后解密回原文。
    let plaintext = b"panther round-trip payload".to_vec();

    for algorithm in [
        "AES",
        "aes/ecb/pkcs5padding",
        "AES/ECB/PKCS7Padding",
        "AES/CBC/PKCS5Padding",
        "DES",
        "DES/CBC/PKCS5Padding",
        "DESede",
        "DESede/CBC/PKCS5Padding",
        "Blowfish",
        "Blowfish/CBC/PKCS5Padding",
    ] {
        let mut pw = Password::from("correct horse");
        let ciphertext =
            engine::transform_with_password(algorithm, Mode::Encrypt, plaintext.clone(), &mut pw)
                .expect("encrypt");
        assert_ne!(ciphertext, plaintext);

        let mut pw = Password::from("correct horse");
        let decrypted =
            engine::transform_with_password(algorithm, Mode::Decrypt, ciphertext, &mut pw)
                .expect("decrypt");
        assert_eq!(decrypted, plaintext, "algorithm {algorithm}");
    }
}

#[test]
fn legacy_vector_is_reproduced() {
    // 与旧版本保持兼容：MD5("password") 作为 AES-128 密钥，ECB + PKCS#5。
    let mut pw = Password::from("password");
    let ciphertext =
        engine::transform_with_password("AES", Mode::Encrypt, b"hello world".to_vec(), &mut pw)
            .expect("encrypt");
    assert_eq!(hex::encode(&ciphertext), "cba1b3fecdd6562e7d84ab07b040f323");

    let mut pw = Password::from("password");
    let plain = engine::transform_with_password("AES", Mode::Decrypt, ciphertext, &mut pw)
        .expect("decrypt");
    assert_eq!(plain, b"hello world");
}

#[test]
fn legacy_vectors_for_older_ciphers() {
    // DES 使用 MD5 的前 8 字节；DESede 与 Blowfish 使用完整的 16 字节。
    for (algorithm, expected) in [
        ("DES", "61b0c2aeb008c6f8f624f78e80a00723"),
        ("DESede", "bed31db621e4ecb027bffacc5441bc5f"),
        ("Blowfish", "3468c39cc5fb935db76be1827fc38094"),
    ] {
        let mut pw = Password::from("password");
        let ciphertext =
            engine::transform_with_password(algorithm, Mode::Encrypt, b"hello world".to_vec(), &mut pw)
                .expect("encrypt");
        assert_eq!(hex::encode(&ciphertext), expected, "algorithm {algorithm}");

        let mut pw = Password::from("password");
        let plain = engine::transform_with_password(algorithm, Mode::Decrypt, ciphertext, &mut pw)
            .expect("decrypt");
        assert_eq!(plain, b"hello world");
    }
}

#[test]
fn generated_keys_work_for_every_cipher() {
    for algorithm in ["AES", "DES", "DESede/CBC/PKCS5Padding", "Blowfish"] {
        let key = Key::generate(1, "k", algorithm).expect("generate");
        let ciphertext =
            engine::transform_with_key(Mode::Encrypt, b"panther".to_vec(), &key).expect("encrypt");
        let block = Transformation::parse(algorithm).expect("parse").block_size();
        assert_eq!(ciphertext.len() % block, 0);
        assert_eq!(
            engine::transform_with_key(Mode::Decrypt, ciphertext, &key).expect("decrypt"),
            b"panther"
        );
    }
}

#[test]
fn wrong_key_fails_with_bad_padding() {
    // 密钥错误必须报告为 BadPadding，而不是 "算法不支持"。
    let right = Key::new(1, "right", "AES", vec![0x11; 16]).expect("right key");
    let wrong = Key::new(2, "wrong", "AES", vec![0x22; 16]).expect("wrong key");

    let ciphertext =
        engine::transform_with_key(Mode::Encrypt, b"hello world".to_vec(), &right).expect("encrypt");
    let err = engine::transform_with_key(Mode::Decrypt, ciphertext, &wrong).unwrap_err();

    assert!(matches!(err, PantherError::BadPadding));
    assert_eq!(err.kind(), ErrorKind::BadPadding);
    assert_ne!(err.kind(), ErrorKind::UnknownAlgorithm);
}

#[test]
fn wrong_password_fails_with_bad_padding() {
    let mut pw = Password::from("alpha");
    let ciphertext =
        engine::transform_with_password("AES", Mode::Encrypt, b"top secret".to_vec(), &mut pw)
            .expect("encrypt");

    let mut pw = Password::from("bravo");
    let err = engine::transform_with_password("AES", Mode::Decrypt, ciphertext, &mut pw)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadPadding);
}

#[test]
fn truncated_ciphertext_is_illegal_block_size() {
    let key = Key::new(1, "k", "AES", vec![0x11; 16]).expect("key");
    let mut ciphertext =
        engine::transform_with_key(Mode::Encrypt, b"0123456789abcdef".to_vec(), &key)
            .expect("encrypt");
    ciphertext.truncate(ciphertext.len() - 3);

    let err = engine::transform_with_key(Mode::Decrypt, ciphertext, &key).unwrap_err();
    assert!(matches!(err, PantherError::IllegalBlockSize { block: 16, .. }));
}

#[test]
fn empty_plaintext_encrypts_to_one_block() {
    let key = Key::new(1, "k", "AES", vec![0x11; 16]).expect("key");
    let ciphertext =
        engine::transform_with_key(Mode::Encrypt, Vec::new(), &key).expect("encrypt");
    assert_eq!(ciphertext.len(), 16);

    let plain = engine::transform_with_key(Mode::Decrypt, ciphertext, &key).expect("decrypt");
    assert!(plain.is_empty());
}

#[test]
fn unsupported_algorithm_and_padding_are_distinguished() {
    assert!(matches!(
        CipherEngine::new("RC4"),
        Err(PantherError::UnknownAlgorithm(_))
    ));
    assert!(matches!(
        CipherEngine::new("AES/CTR/NoPadding"),
        Err(PantherError::UnknownAlgorithm(_))
    ));
    assert!(matches!(
        CipherEngine::new("AES/ECB/ISO10126Padding"),
        Err(PantherError::UnknownPadding(_))
    ));
}

#[test]
fn password_is_wiped_after_init() {
    // init 返回后口令缓冲区必须已经全部清零，长度不变。
    let mut engine = CipherEngine::new("AES").expect("engine");
    let (sink, rx) = ChannelSink::new();
    let mut pw = Password::from("wipe me");

    engine
        .init(b"data".to_vec(), Mode::Encrypt, &mut pw, sink)
        .expect("init");
    assert_eq!(pw.len(), 7);
    assert!(pw.is_wiped());

    engine.run().expect("run");
    assert!(rx.recv().expect("result").is_ok());
}

#[test]
fn spawned_engine_delivers_once_and_is_reusable() {
    let key = Key::new(1, "k", "AES/CBC/PKCS5Padding", vec![0x33; 32]).expect("key");
    let mut engine = CipherEngine::new(key.algorithm()).expect("engine");
    let (sink, rx) = ChannelSink::new();

    engine
        .init_with_key(b"panther payload".to_vec(), Mode::Encrypt, &key, sink.clone())
        .expect("init");
    let mut engine = engine.spawn().expect("spawn").wait().expect("join").expect("run");
    assert_eq!(engine.state(), EngineState::Completed);

    let ciphertext = rx.recv().expect("first result").expect("encrypt");
    assert!(rx.try_recv().is_err());

    engine
        .init_with_key(ciphertext, Mode::Decrypt, &key, sink)
        .expect("re-init");
    assert_eq!(engine.current_mode(), Some(Mode::Decrypt));
    engine.run().expect("run");
    assert_eq!(rx.recv().expect("second result").expect("decrypt"), b"panther payload");
}

#[test]
fn wrong_key_delivered_through_sink() {
    let right = Key::new(1, "right", "AES", vec![0x33; 32]).expect("key");
    let wrong = Key::new(2, "wrong", "AES", vec![0x44; 32]).expect("key");
    let ciphertext =
        engine::transform_with_key(Mode::Encrypt, b"panther payload".to_vec(), &right)
            .expect("encrypt");

    let mut engine = CipherEngine::new("AES").expect("engine");
    let (sink, rx) = ChannelSink::new();
    engine
        .init_with_key(ciphertext, Mode::Decrypt, &wrong, sink)
        .expect("init");
    engine.run().expect("run returns ok");

    let delivered = rx.recv().expect("result");
    assert!(matches!(delivered, Err(PantherError::BadPadding)));
}

#[test]
fn different_passwords_derive_different_keys() {
    let a = kdf::derive_key(&Password::from("alpha"), "AES").expect("derive a");
    let b = kdf::derive_key(&Password::from("bravo"), "AES").expect("derive b");
    let a_again = kdf::derive_key(&Password::from("alpha"), "AES").expect("derive a again");

    assert_ne!(*a, *b);
    assert_eq!(*a, *a_again);
    assert_eq!(a.len(), 16);
    Transformation::parse("AES")
        .expect("parse")
        .check_key(&a)
        .expect("derived key is usable");

    let des = kdf::derive_key(&Password::from("alpha"), "DES").expect("derive des");
    assert_eq!(*des, a[..8]);
}
