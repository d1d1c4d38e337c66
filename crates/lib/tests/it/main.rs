/*! Integration tests for smart-session.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - policy: Permission id hashing over policy sets
 * - storage: The key-value backends
 * - session: The key store and the record store over a shared backend
 * - permission: Permission checks against mock account providers
 * - dispatch: Sending operations through stored sessions
 * - manager: Session creation and context gating
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("smart_session=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod policy;
mod storage;
