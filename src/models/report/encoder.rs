use super::executor::ResultSet;

/// Header row of column names, then one record per row. NULL becomes an
/// empty field.
pub fn encode_csv(result: &ResultSet) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&result.columns)?;
    for row in &result.rows {
        wtr.write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["nama".into(), "bidang".into(), "total".into()],
            rows: vec![
                vec![Some("O'Brien, Ani".into()), Some("Sosial".into()), Some("3".into())],
                vec![Some("Budi \"B\"".into()), None, Some("0".into())],
            ],
        }
    }

    #[test]
    fn reads_back_with_nulls_as_empty() {
        let bytes = encode_csv(&sample()).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());

        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, vec!["nama", "bidang", "total"]);

        let rows: Vec<Vec<String>> = rdr
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["O'Brien, Ani", "Sosial", "3"],
                vec!["Budi \"B\"", "", "0"],
            ]
        );
    }

    #[test]
    fn empty_result_is_header_only() {
        let rs = ResultSet {
            columns: vec!["a".into(), "b".into()],
            rows: Vec::new(),
        };
        assert_eq!(encode_csv(&rs).unwrap(), b"a,b\n");
    }
}
