mod health_tests;
mod identity_tests;
mod merge_tests;
mod notes_tests;
