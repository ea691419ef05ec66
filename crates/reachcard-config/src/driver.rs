//! Supported boards.

/// `(compatible, driver name)` for every board the card driver binds to.
pub const SUPPORTED_BOARDS: [(&str, &str); 6] = [
    ("qcom,qcm6490-idp-sndcard", "qcm6490"),
    ("qcom,qcs6490-rb3gen2-sndcard", "qcs6490"),
    ("qcom,qcs8275-sndcard", "qcs8275"),
    ("qcom,qcs8300-sndcard", "qcs8300"),
    ("qcom,qcs9075-sndcard", "qcs9075"),
    ("qcom,qcs9100-sndcard", "qcs9100"),
];

/// Driver name for a compatible string, if the board is supported.
pub fn driver_name(compatible: &str) -> Option<&'static str> {
    SUPPORTED_BOARDS
        .iter()
        .find(|(c, _)| *c == compatible)
        .map(|(_, driver)| *driver)
}
