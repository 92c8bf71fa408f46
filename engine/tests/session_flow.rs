use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use panther::config::{self, Preferences};
use panther::crypto::kdf::StoreKdfParams;
use panther::engine::Mode;
use panther::keystore::DEFAULT_KEY_NAME;
use panther::session::SessionInfo;
use panther::{
    DefaultPlatform, ErrorKind, PantherError, Password, PasswordPrompt, PlatformIntegration,
    Result, Session,
};

/// 按顺序回放预设输入；`None` 表示用户取消
struct ScriptedPrompt {
    answers: RefCell<VecDeque<Option<&'static str>>>,
}

impl ScriptedPrompt {
    fn new(answers: &[Option<&'static str>]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
        }
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn prompt(&self, _message: &str) -> Result<Option<Password>> {
        let next = self
            .answers
            .borrow_mut()
            .pop_front()
            .expect("prompt asked more times than scripted");
        Ok(next.map(Password::from))
    }
}

#[derive(Clone, Default)]
struct RecordingPlatform {
    events: Arc<Mutex<Vec<String>>>,
}

impl PlatformIntegration for RecordingPlatform {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_ready(&self, session: &SessionInfo) {
        self.events.lock().unwrap().push(format!(
            "ready keys={} first_run={}",
            session.key_count, session.first_run
        ));
    }

    fn on_quit(&self) {
        self.events.lock().unwrap().push("quit".to_string());
    }
}

/// 写入使用轻量 KDF 参数的偏好文件，避免测试过慢
fn prepare_config(dir: &Path) {
    let mut prefs = Preferences::default();
    prefs.keystore.kdf = StoreKdfParams::new(1024, 1, 1);
    prefs
        .save(&config::properties_path(dir))
        .expect("write preferences");
}

fn open(dir: &Path, answers: &[Option<&'static str>]) -> Result<Session> {
    Session::open(dir, &ScriptedPrompt::new(answers), Box::new(DefaultPlatform))
}

#[test]
fn first_run_creates_store_then_reopens() {
    // 首次运行：设置主密码并生成默认密钥；再次打开时只需输入一次主密码。
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let platform = RecordingPlatform::default();

    let session = Session::open(
        temp_dir.path(),
        &ScriptedPrompt::new(&[Some("master"), Some("master")]),
        Box::new(platform.clone()),
    )
    .expect("first run");
    assert!(session.keystore_path().exists());
    assert!(session.keystore().contains(DEFAULT_KEY_NAME));
    session.close().expect("close");

    let session = Session::open(
        temp_dir.path(),
        &ScriptedPrompt::new(&[Some("master")]),
        Box::new(platform.clone()),
    )
    .expect("second run");
    assert_eq!(session.keystore().len(), 1);
    session.close().expect("close");

    let events = platform.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "ready keys=1 first_run=true",
            "quit",
            "ready keys=1 first_run=false",
            "quit"
        ]
    );
}

#[test]
fn first_run_mismatch_creates_nothing() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());

    let err = open(temp_dir.path(), &[Some("one"), Some("two")]).err().expect("mismatch");
    assert!(matches!(err, PantherError::PasswordMismatch));
    assert!(!config::keystore_path(temp_dir.path()).exists());
}

#[test]
fn cancelled_prompt_is_reported() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());

    let err = open(temp_dir.path(), &[None]).err().expect("cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn missing_preferences_are_created_with_defaults() {
    let temp_dir = tempdir().expect("create temp dir");
    let path = config::properties_path(temp_dir.path());
    assert!(!path.exists());

    let prefs = Preferences::load_or_create(&path).expect("load or create");
    assert_eq!(prefs.encryption_algorithm, "AES");
    assert_eq!(prefs.digest_algorithm, "SHA-1");
    assert!(path.exists());
}

#[test]
fn wrong_master_password_on_reopen() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    open(temp_dir.path(), &[Some("master"), Some("master")])
        .expect("first run")
        .close()
        .expect("close");

    let err = open(temp_dir.path(), &[Some("guess")]).err().expect("wrong password");
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn key_changes_are_saved_immediately() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());

    let mut session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");
    session.create_key("work", Some(b"entropy")).expect("create work");
    assert!(matches!(
        session.create_key("work", None),
        Err(PantherError::DuplicateName(_))
    ));
    assert!(session.delete_key(DEFAULT_KEY_NAME).expect("delete"));
    assert!(!session.delete_key("ghost").expect("delete missing"));
    // 不调用 close，直接丢弃会话
    drop(session);

    let session = open(temp_dir.path(), &[Some("master")]).expect("reopen");
    let names: Vec<&str> = session.keystore().keys().iter().map(|k| k.name()).collect();
    assert_eq!(names, ["work"]);
}

#[test]
fn change_password_requires_matching_confirmation() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let mut session = open(temp_dir.path(), &[Some("old"), Some("old")]).expect("open");

    let err = session
        .change_password(Password::from("new"), Password::from("typo"))
        .unwrap_err();
    assert!(matches!(err, PantherError::PasswordMismatch));

    session
        .change_password(Password::from("new"), Password::from("new"))
        .expect("change password");
    drop(session);

    let err = open(temp_dir.path(), &[Some("old")]).err().expect("old password");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    open(temp_dir.path(), &[Some("new")]).expect("new password");
}

#[test]
fn failed_password_change_keeps_the_old_password() {
    // 新密码写盘失败时，会话继续使用旧密码，后续保存不会悄悄换成新密码。
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let mut session = open(temp_dir.path(), &[Some("old"), Some("old")]).expect("open");

    let store_path = session.keystore_path();
    fs::remove_file(&store_path).expect("remove store");
    fs::create_dir(&store_path).expect("block store path");
    fs::write(store_path.join("occupied"), b"x").expect("fill blocking dir");

    session
        .change_password(Password::from("new"), Password::from("new"))
        .expect_err("save must fail");

    fs::remove_dir_all(&store_path).expect("unblock store path");
    session.close().expect("close");

    let err = open(temp_dir.path(), &[Some("new")]).err().expect("new password rejected");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    open(temp_dir.path(), &[Some("old")]).expect("old password still works");
}

#[test]
fn named_key_encryption_and_unknown_key() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");

    let ciphertext = session
        .encrypt_with_key(DEFAULT_KEY_NAME, b"hello world".to_vec())
        .expect("encrypt");
    let plain = session
        .decrypt_with_key(DEFAULT_KEY_NAME, ciphertext)
        .expect("decrypt");
    assert_eq!(plain, b"hello world");

    let err = session.encrypt_with_key("ghost", b"x".to_vec()).unwrap_err();
    assert!(matches!(err, PantherError::UnknownKey(name) if name == "ghost"));
}

#[test]
fn quick_encryption_uses_preferred_algorithm() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");

    let mut pw = Password::from("password");
    let ciphertext = session
        .transform_with_password(Mode::Encrypt, b"hello world".to_vec(), &mut pw)
        .expect("encrypt");
    assert!(pw.is_wiped());
    assert_eq!(hex::encode(&ciphertext), "cba1b3fecdd6562e7d84ab07b040f323");
}

#[test]
fn fingerprints_follow_digest_preference() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let mut session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");

    assert_eq!(
        session.fingerprint(b"abc").expect("sha-1"),
        "A9:99:3E:36:47:06:81:6A:BA:3E:25:71:78:50:C2:6C:9C:D0:D8:9D"
    );
    let key_fp = session.key_fingerprint(DEFAULT_KEY_NAME).expect("key fingerprint");
    assert_eq!(key_fp.split(':').count(), 20);

    let mut prefs = session.preferences().clone();
    prefs.digest_algorithm = "MD5".to_string();
    session.update_preferences(prefs).expect("update preferences");
    assert_eq!(
        session.fingerprint(b"password").expect("md5"),
        "5F:4D:CC:3B:5A:A7:65:D6:1D:83:27:DE:B8:82:CF:99"
    );

    let reloaded = Preferences::load(&config::properties_path(temp_dir.path())).expect("reload");
    assert_eq!(reloaded.digest_algorithm, "MD5");
}

#[test]
fn file_roundtrip_with_named_key() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");

    let input = temp_dir.path().join("plain.txt");
    let encrypted = temp_dir.path().join("plain.txt.enc");
    let decrypted = temp_dir.path().join("plain.out.txt");
    fs::write(&input, b"panther file payload").expect("write input");

    session
        .transform_file(Mode::Encrypt, DEFAULT_KEY_NAME, &input, &encrypted)
        .expect("encrypt file");
    session
        .transform_file(Mode::Decrypt, DEFAULT_KEY_NAME, &encrypted, &decrypted)
        .expect("decrypt file");

    assert_eq!(fs::read(&decrypted).expect("read output"), b"panther file payload");

    let err = session
        .transform_file(
            Mode::Encrypt,
            DEFAULT_KEY_NAME,
            &temp_dir.path().join("missing.txt"),
            &encrypted,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn import_and_export_through_session() {
    let temp_dir = tempdir().expect("create temp dir");
    prepare_config(temp_dir.path());
    let mut session = open(temp_dir.path(), &[Some("master"), Some("master")]).expect("open");

    let raw = temp_dir.path().join("default.key");
    session.export_key(DEFAULT_KEY_NAME, &raw).expect("export");
    session.import_key(&raw, "copy").expect("import");
    drop(session);

    let session = open(temp_dir.path(), &[Some("master")]).expect("reopen");
    assert_eq!(
        session.keystore().get("copy").expect("copy").material(),
        session
            .keystore()
            .get(DEFAULT_KEY_NAME)
            .expect("default")
            .material()
    );
}
