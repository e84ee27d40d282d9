//! Prediction Insight Text

use feature_engine::CalendarInputs;

/// Explain which operating conditions drive the prediction
pub fn explain(inputs: &CalendarInputs) -> Vec<&'static str> {
    let temperature = if inputs.temperature > 30.0 {
        "High temperature may increase cooling demand (AC usage)."
    } else if inputs.temperature < 10.0 {
        "Low temperature may increase heating demand."
    } else {
        "Moderate temperature suggests balanced energy usage."
    };

    let hour = match inputs.hour {
        6..=10 => "Morning hours typically show increased residential consumption.",
        18..=22 => "Evening peak hours usually result in higher electricity usage.",
        _ => "Selected hour falls outside major peak periods.",
    };

    let holiday = if inputs.holiday {
        "Holiday factor may alter commercial and residential consumption patterns."
    } else {
        "Regular working day consumption pattern applied."
    };

    vec![temperature, hour, holiday]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(temperature: f64, hour: u8, holiday: bool) -> CalendarInputs {
        CalendarInputs {
            temperature,
            holiday,
            hour,
            day: 1,
            month: 1,
            weekday: 0,
        }
    }

    #[test]
    fn test_hot_evening_holiday() {
        let lines = explain(&inputs(35.0, 19, true));
        assert!(lines[0].contains("cooling"));
        assert!(lines[1].contains("Evening"));
        assert!(lines[2].contains("Holiday"));
    }

    #[test]
    fn test_threshold_edges() {
        // temperature thresholds are exclusive, hour windows inclusive
        assert!(explain(&inputs(30.0, 10, false))[0].contains("Moderate"));
        assert!(explain(&inputs(10.0, 10, false))[0].contains("Moderate"));
        assert!(explain(&inputs(9.9, 10, false))[0].contains("heating"));
        assert!(explain(&inputs(20.0, 10, false))[1].contains("Morning"));
        assert!(explain(&inputs(20.0, 23, false))[1].contains("outside"));
        assert!(explain(&inputs(20.0, 5, false))[2].contains("working day"));
    }
}
