use std::{fs, path::Path};

use analysis_lab::data::{load_processed, load_vds_dir, save_processed};
use encoding_rs::EUC_KR;

fn write_euc_kr(path: &Path, text: &str) {
    let (bytes, _, _) = EUC_KR.encode(text);
    fs::write(path, bytes).unwrap();
}

#[test]
fn unreadable_files_are_skipped_and_not_counted() {
    let tmp = tempfile::tempdir().unwrap();
    let jan = tmp.path().join("VDS_2024_01");
    let feb = tmp.path().join("VDS_2024_02");
    let other = tmp.path().join("archive");
    for d in [&jan, &feb, &other] {
        fs::create_dir_all(d).unwrap();
    }

    write_euc_kr(
        &jan.join("01.csv"),
        "기준시간,기준일,요일명,노드명,교통량,평균속도\n\
         0,20240101,월요일,안현JC,\"1,200\",80\n\
         1,20240101,월요일,서울TG,900,95\n",
    );
    // 0xFF never starts an EUC-KR sequence
    fs::write(jan.join("02.csv"), [0xFFu8, 0xFF, 0x0A]).unwrap();
    write_euc_kr(&feb.join("01.csv"), "foo,bar\n1,2\n");
    write_euc_kr(
        &feb.join("02.csv"),
        "기준일,요일명,노드명,교통량,평균속도\n\
         20240201,목요일,도리JC,600,0\n\
         20240201,목요일,조남JC,750,75\n",
    );
    // Outside every VDS_ folder
    write_euc_kr(
        &other.join("01.csv"),
        "노드명,교통량,평균속도\n일직JC,100,50\n",
    );

    let report = load_vds_dir(tmp.path(), "VDS_").unwrap();
    assert_eq!(report.files_found, 4);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.merged_rows, 4);

    let nodes: Vec<&str> = report
        .records
        .iter()
        .filter_map(|r| r.node.as_deref())
        .collect();
    assert_eq!(nodes, vec!["안현JC", "조남JC"]);
    assert_eq!(report.records[0].density, Some(15.0));
    assert_eq!(report.records[1].base_time, None);

    let out = tmp.path().join("data/processed/jc_filtered_data.csv");
    save_processed(&out, &report.records).unwrap();
    assert_eq!(load_processed(&out).unwrap(), report.records);
}
