#[cfg(test)]
mod check_test;
