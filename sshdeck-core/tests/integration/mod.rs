mod executor_tests;
mod mock_session;
mod russh_tests;
