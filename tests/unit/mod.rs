// Store-level tests below the HTTP layer

mod store_concurrency_test;
