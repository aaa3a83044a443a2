mod drain_tests;
mod echo_tests;
mod host_key_tests;
mod registry_tests;
