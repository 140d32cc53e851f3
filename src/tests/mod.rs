mod common;

mod assertion_signing;
