/*! Integration tests for Nimbus.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - value: Tests for the Value model and its containers
 * - operation: Tests for operations and the reducer, including property tests
 * - record: Tests for the Record binding, pending operations and flushing
 * - codec: Tests for the JSON wire format
 * - remote: Tests for saving and fetching through a RemoteStore
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nimbus=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod codec;
mod helpers;
mod operation;
mod record;
