use csv::Writer;
use nalgebra::DVector;
use std::fs::File;
use std::io::{self, Write};

const HISTORY_HEADERS: [&str; 8] = ["iteration", "a", "b", "c", "d", "e", "f", "loss"];

/// Save the parameter and loss history of a fitting run as tab separated
/// text, one row per iteration including the seeded initial state.
pub fn save_history_to_file(
    theta_history: &[DVector<f64>],
    cost_history: &[f64],
    filename: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;
    // Write headers
    writeln!(file, "{}", HISTORY_HEADERS.join("\t"))?;
    for (i, (theta, cost)) in theta_history.iter().zip(cost_history.iter()).enumerate() {
        let mut row_data = Vec::new();
        row_data.push(i.to_string());
        row_data.extend(theta.iter().map(|&val| val.to_string()));
        row_data.push(cost.to_string());
        writeln!(file, "{}", row_data.join("\t"))?;
    }

    Ok(())
}

/// Same history in CSV form.
pub fn save_history_to_csv(
    theta_history: &[DVector<f64>],
    cost_history: &[f64],
    filename: &str,
) -> io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);

    // Prepare and write headers
    writer.write_record(HISTORY_HEADERS)?;

    // Write data rows
    for (i, (theta, cost)) in theta_history.iter().zip(cost_history.iter()).enumerate() {
        let mut row_data = Vec::new();
        row_data.push(i.to_string());
        row_data.extend(theta.iter().map(|&val| val.to_string()));
        row_data.push(cost.to_string());
        writer.write_record(&row_data)?;
    }

    writer.flush()?;
    Ok(())
}
