// End-to-end tests for the narration server
//
// Each test gets its own server bound to an ephemeral port, backed by an
// artifact store in a fresh temp directory. Synthesis goes through fake
// providers whose availability each test can switch on and off, so the
// selection and fallback paths run without piper, espeak-ng or AWS.

mod helpers;
mod test_generation;
mod test_health;
