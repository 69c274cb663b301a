/// Build a program that prints `text` byte by byte through cell 0.
pub fn encode(text: &str) -> String {
    let mut program = String::from("[0");
    for byte in text.bytes() {
        program.push_str(&format!(" {byte} ."));
    }
    program.push(']');
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_each_byte_as_assign_then_output() {
        assert_eq!(encode("Hi"), "[0 72 . 105 .]");
    }

    #[test]
    fn empty_text_is_still_a_valid_program() {
        assert_eq!(encode(""), "[0]");
    }
}
