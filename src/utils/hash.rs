/// Random transaction identifier: `0x` followed by 64 lowercase hex digits
pub fn generate_tx_hash() -> String {
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for _ in 0..4 {
        hash.push_str(&format!("{:016x}", fastrand::u64(..)));
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hash_shape() {
        let hash = generate_tx_hash();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hashes_do_not_repeat() {
        let hashes: HashSet<String> = (0..1000).map(|_| generate_tx_hash()).collect();
        assert_eq!(hashes.len(), 1000);
    }
}
