use internment::Intern;

/// An interned identifier. Cheap to copy, hash and compare.
pub type Ident = Intern<String>;

pub fn ident(name: &str) -> Ident {
    Intern::new(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_ident() {
        assert_eq!(ident("fib"), ident("fib"));
        assert_ne!(ident("fib"), ident("fab"));
        assert_eq!(ident("clock").as_str(), "clock");
    }
}
